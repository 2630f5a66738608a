//! The central loop: owns the input source, feeds keys into the editor
//! state machine and carries out the returned effects.

use std::process::Command;

use anyhow::Result;
use crossterm::event::{self, Event};
use hexvi_editor::{Editor, Effect};
use hexvi_messages::Size;

use crate::input::convert_key_event;
use crate::terminal::{draw_progress, Terminal};
use crate::ui;

pub fn run(mut editor: Editor) -> Result<()> {
    let mut term = Terminal::new()?;
    editor.set_size(term.size());
    editor.set_progress_fn(Box::new(draw_progress));

    loop {
        ui::draw(&mut term, &editor.frame())?;
        term.flush()?;

        match event::read()? {
            Event::Key(key) => {
                let key = convert_key_event(key);
                for effect in editor.feed(key) {
                    match effect {
                        Effect::Bell => term.bell()?,
                        Effect::Quit => return Ok(()),
                        Effect::Suspend => {
                            term.suspend(run_shell)?;
                        }
                    }
                }
            }
            Event::Resize(width, height) => {
                let size = Size {
                    width: width as usize,
                    height: height as usize,
                };
                term.resize(size.width, size.height)?;
                editor.set_size(size);
            }
            Event::Mouse(_) => {}
        }
    }
}

fn run_shell() {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| String::from("/bin/sh"));
    println!("Type 'exit' to return.");
    match Command::new(&shell).status() {
        Ok(_) => {}
        Err(e) => log::warn!("could not run {}: {}", shell, e),
    }
}
