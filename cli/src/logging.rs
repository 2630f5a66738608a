use std::fs::OpenOptions;

/// Log to a file; stderr belongs to the raw-mode terminal.
pub(crate) fn setup(debug: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    let path = std::env::temp_dir().join("hexvi.log");
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    let _ = builder.try_init();
}
