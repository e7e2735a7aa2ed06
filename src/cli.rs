use crate::clipboard::Clipboard;
use crate::manager::CodeManager;
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the loop wakes up without input to expire transient state
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Everything that reaches the event loop
pub enum Msg {
    Input(String),
    Tick,
    CopyFinished(Result<()>),
    InputClosed,
}

pub struct Context {
    pub manager: CodeManager,
    pub clipboard: Arc<dyn Clipboard>,
    pub tx: Sender<Msg>,
    pub rx: Receiver<Msg>,
    pub startup_delay: Duration,
}

/// Generate one code (optionally copying it) and return
pub fn run_once(ctx: &mut Context, copy: bool) -> Result<()> {
    ctx.manager.generate();
    if copy {
        if let Some(payload) = ctx.manager.copy_to_clipboard() {
            let result = ctx.clipboard.write_text(&payload);
            ctx.manager.finish_copy(result);
        }
    }
    Ok(())
}

pub fn run_repl(mut ctx: Context) -> Result<()> {
    println!("vcode - Enter or Space for a new code, /copy to copy it, /help for commands");

    ctx.manager.start();
    thread::sleep(ctx.startup_delay);
    ctx.manager.generate();

    let (ack_tx, ack_rx) = mpsc::channel();
    let input = spawn_input(ctx.tx.clone(), ack_rx);

    loop {
        match ctx.rx.recv_timeout(POLL_INTERVAL) {
            Ok(msg) => {
                let is_input = matches!(msg, Msg::Input(_));
                if dispatch(&mut ctx, msg) {
                    break;
                }
                if is_input {
                    // let the input thread read the next line
                    let _ = ack_tx.send(());
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        ctx.manager.poll();
    }

    drop(ack_tx);
    let _ = input.join();
    Ok(())
}

/// Handle one message. Returns true when the session should end.
fn dispatch(ctx: &mut Context, msg: Msg) -> bool {
    match msg {
        Msg::Input(line) => handle_line(ctx, &line),
        Msg::Tick => {
            ctx.manager.tick();
            false
        }
        Msg::CopyFinished(result) => {
            ctx.manager.finish_copy(result);
            false
        }
        Msg::InputClosed => true,
    }
}

/// Reads lines on its own thread. After each line it waits for an ack so
/// the loop can use stdin (confirmation prompt) without racing the editor.
fn spawn_input(tx: Sender<Msg>, ack: Receiver<()>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Input error: {}", e);
                let _ = tx.send(Msg::InputClosed);
                return;
            }
        };

        loop {
            match rl.readline("> ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    if tx.send(Msg::Input(line)).is_err() || ack.recv().is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    let _ = tx.send(Msg::InputClosed);
                    break;
                }
                Err(e) => {
                    eprintln!("Input error: {}", e);
                    let _ = tx.send(Msg::InputClosed);
                    break;
                }
            }
        }
    })
}

/// Run the clipboard write off the loop; the result comes back as a message
fn start_copy(ctx: &mut Context) {
    let Some(payload) = ctx.manager.copy_to_clipboard() else {
        return;
    };
    let clipboard = Arc::clone(&ctx.clipboard);
    let tx = ctx.tx.clone();
    thread::spawn(move || {
        let result = clipboard.write_text(&payload);
        let _ = tx.send(Msg::CopyFinished(result));
    });
}

fn handle_line(ctx: &mut Context, line: &str) -> bool {
    // Enter and Space are the generate keys
    if line.trim().is_empty() {
        ctx.manager.generate();
        return false;
    }

    let parts: Vec<&str> = line.trim().splitn(2, ' ').collect();
    match parts[0] {
        "/exit" | "/quit" => return true,
        "/help" => {
            println!("Keys:");
            println!("  Enter / Space   - generate a new code");
            println!("Commands:");
            println!("  /new            - generate a new code");
            println!("  /copy           - copy the current code (without hyphen)");
            println!("  /status         - show the current code and countdown");
            println!("  /history        - show the code history");
            println!("  /stats          - show total and valid codes");
            println!("  /clear          - clear the history (asks first)");
            println!("  /exit           - quit");
        }
        "/new" | "/generate" => {
            ctx.manager.generate();
        }
        "/copy" => start_copy(ctx),
        "/status" => ctx.manager.show_status(),
        "/history" => ctx.manager.show_history(),
        "/stats" => ctx.manager.show_stats(),
        "/clear" => {
            ctx.manager.clear_history();
        }
        cmd if cmd.starts_with('/') => println!("Unknown command: {}", cmd),
        _ => println!("Press Enter for a new code, or type /help"),
    }
    false
}
