use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::ActionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrefKind {
    Int,
    Bool,
}

/// The enumerated preference table. Long name, short alias, kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub(crate) enum Pref {
    Grouping,
    Columns,
    SearchHl,
    IgnoreCase,
    LittleEndian,
}

impl Pref {
    pub fn name(&self) -> &'static str {
        match self {
            Pref::Grouping => "grouping",
            Pref::Columns => "columns",
            Pref::SearchHl => "search_hl",
            Pref::IgnoreCase => "ignorecase",
            Pref::LittleEndian => "little_endian",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Pref::Grouping => "grp",
            Pref::Columns => "cols",
            Pref::SearchHl => "hl",
            Pref::IgnoreCase => "ic",
            Pref::LittleEndian => "le",
        }
    }

    pub fn kind(&self) -> PrefKind {
        match self {
            Pref::Grouping | Pref::Columns => PrefKind::Int,
            Pref::SearchHl | Pref::IgnoreCase | Pref::LittleEndian => PrefKind::Bool,
        }
    }

    fn from_token(tok: &str) -> Option<Pref> {
        Pref::iter().find(|p| p.name() == tok || p.alias() == tok)
    }
}

/// Current preference values with their defaults.
#[derive(Debug, Clone)]
pub(crate) struct Preferences {
    /// Bytes per displayed group, controls insert/overwrite alignment.
    pub grouping: u64,
    /// Bytes per line; 0 fits as many as the terminal takes.
    pub columns: usize,
    pub search_hl: bool,
    pub ignorecase: bool,
    /// Show groups least significant byte first.
    pub little_endian: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            grouping: 1,
            columns: 0,
            search_hl: true,
            ignorecase: false,
            little_endian: false,
        }
    }
}

impl Preferences {
    /// Set a preference by long name or alias. Missing bool values
    /// toggle on; int values are required.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<(), ActionError> {
        let pref = Pref::from_token(name)
            .ok_or_else(|| ActionError::Invalid(format!("Unknown setting: {}", name)))?;

        match pref.kind() {
            PrefKind::Int => {
                let value = value
                    .ok_or_else(|| ActionError::Invalid(format!("{} needs a value", name)))?;
                let n: u64 = value
                    .parse()
                    .map_err(|_| ActionError::Invalid(format!("Bad value: {}", value)))?;
                match pref {
                    Pref::Grouping => {
                        if !matches!(n, 1 | 2 | 4 | 8) {
                            return Err(ActionError::Invalid(
                                "grouping must be 1, 2, 4 or 8".into(),
                            ));
                        }
                        self.grouping = n;
                    }
                    Pref::Columns => self.columns = n as usize,
                    _ => unreachable!(),
                }
            }
            PrefKind::Bool => {
                let on = match value {
                    None => true,
                    Some(v) => match v.to_ascii_lowercase().as_str() {
                        "1" | "true" | "on" | "yes" => true,
                        "0" | "false" | "off" | "no" => false,
                        _ => {
                            return Err(ActionError::Invalid(format!("Bad value: {}", v)));
                        }
                    },
                };
                match pref {
                    Pref::SearchHl => self.search_hl = on,
                    Pref::IgnoreCase => self.ignorecase = on,
                    Pref::LittleEndian => self.little_endian = on,
                    _ => unreachable!(),
                }
            }
        }
        Ok(())
    }

    fn display(&self, pref: Pref) -> String {
        match pref {
            Pref::Grouping => self.grouping.to_string(),
            Pref::Columns => self.columns.to_string(),
            Pref::SearchHl => bool_str(self.search_hl),
            Pref::IgnoreCase => bool_str(self.ignorecase),
            Pref::LittleEndian => bool_str(self.little_endian),
        }
    }

    /// The `:set` listing, one aligned line per entry.
    pub fn listing(&self) -> Vec<String> {
        let mut lines = vec![format!(
            " {:<24}{:<10}{}",
            "[Setting Name]", "[Alias]", "[Value]"
        )];
        for pref in Pref::iter() {
            lines.push(format!(
                " {:<24}{:<10}= {}",
                pref.name(),
                pref.alias(),
                self.display(pref)
            ));
        }
        lines
    }
}

fn bool_str(v: bool) -> String {
    if v { "TRUE" } else { "FALSE" }.to_string()
}
