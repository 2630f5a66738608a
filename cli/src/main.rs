mod logging;

use std::path::PathBuf;

use clap::Parser;
use hexvi_buffer::expand_path;
use hexvi_editor::Editor;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files to open
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Turn debugging information on
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::setup(cli.debug);

    let mut editor = Editor::new();
    for file in &cli.files {
        let path = expand_path(file);
        if let Err(e) = editor.open_file(&path) {
            eprintln!("{}", e);
        }
    }
    editor.ensure_file();

    if let Err(e) = hexvi_terminal_client::run(editor) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
