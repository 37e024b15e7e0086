use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use serde_json::{Value, json};

use markpad::app::controllers::menu::Menu;
use markpad::app::infrastructure::config_store::{ConfigStore, keys};
use markpad::app::services::updater::{GitHubReleaseSource, UpdateChannel};
use markpad::app::{Platform, Result, detect_system_dark_mode};
use markpad::ipc::{Collaborators, EventBus, EventKind, IpcRouter};

mod logging;

#[cfg(not(target_os = "windows"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const RELEASE_OWNER: &str = "markpad";
const RELEASE_REPO: &str = "markpad";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "markpad")]
#[command(about = "Main process of the MarkPad markdown editor", long_about = None)]
#[command(version)]
struct Args {
    /// Markdown files to open after the previous session is restored
    #[arg(value_name = "FILES")]
    files: Vec<String>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Platform whose menu conventions to use (mac, windows, linux)
    #[arg(long, value_name = "PLATFORM")]
    platform: Option<String>,

    /// Skip the automatic update check at startup
    #[arg(long)]
    no_update_check: bool,
}

/// One line from the renderer or native shell.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HostMessage {
    Request {
        id: u64,
        channel: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    Menu {
        menu: String,
    },
    Quit {
        quit: bool,
    },
}

fn write_line(value: &Value) -> io::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    out.write_all(b"\n")?;
    out.flush()
}

fn send_menu(menu: &Menu, last: &mut Option<Menu>) -> io::Result<()> {
    if last.as_ref() == Some(menu) {
        return Ok(());
    }
    write_line(&json!({ "menuTemplate": menu }))?;
    *last = Some(menu.clone());
    Ok(())
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });
    rx
}

/// Answer host messages until stdin closes, a quit arrives, or stdout fails.
fn serve(router: &mut IpcRouter, events: &EventBus) -> io::Result<()> {
    let mut last_menu = None;
    send_menu(router.menu(), &mut last_menu)?;
    events.flush();

    let lines = spawn_stdin_reader();
    loop {
        let line = match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                router.poll_updates();
                events.flush();
                continue;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<HostMessage>(&line) {
            Ok(HostMessage::Request { id, channel, args }) => {
                let response = router.handle(&channel, &args);
                write_line(&json!({ "id": id, "response": response }))?;
            }
            Ok(HostMessage::Menu { menu }) => {
                if let Err(e) = router.activate_menu(&menu) {
                    tracing::warn!(item = %menu, error = %e, "menu activation failed");
                }
            }
            Ok(HostMessage::Quit { quit: true }) => return Ok(()),
            Ok(HostMessage::Quit { quit: false }) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring malformed message"),
        }

        router.poll_updates();
        events.flush();
        send_menu(router.menu(), &mut last_menu)?;
    }
}

/// Run the main-process loop. Returns `true` when an update was installed
/// and the program should relaunch.
fn run(args: Args, platform: Platform) -> Result<bool> {
    let config_path = args.config.unwrap_or_else(ConfigStore::default_path);
    let mut store = ConfigStore::open(&config_path);
    if let Some(err) = store.load_error() {
        tracing::warn!(error = err, "config was reset");
    }
    if !store.contains(keys::THEME) {
        let theme = if detect_system_dark_mode() { "dark" } else { "light" };
        store.set(keys::THEME, json!(theme))?;
    }
    let config = store.into_shared();

    let source = GitHubReleaseSource::new(
        RELEASE_OWNER,
        RELEASE_REPO,
        env!("CARGO_PKG_VERSION"),
        UpdateChannel::Stable,
    );
    let mut router = IpcRouter::new(
        config,
        platform,
        Box::new(source),
        Collaborators::default(),
    );

    let events = router.events();
    for kind in EventKind::ALL {
        let channel = kind.channel();
        events.subscribe(
            kind,
            Rc::new(move |args: &[Value]| {
                if let Err(e) = write_line(&json!({ "event": channel, "args": args })) {
                    tracing::warn!(channel, error = %e, "failed to write event");
                }
            }),
        );
    }

    router.startup(&args.files);
    if !args.no_update_check {
        router.auto_check_updates();
    }

    if let Err(e) = serve(&mut router, &events) {
        tracing::warn!(error = %e, "host output closed");
    }

    tracing::info!("shutting down");
    router.shutdown()
}

fn relaunch() -> io::Result<()> {
    let exe = std::env::current_exe()?;
    std::process::Command::new(exe)
        .args(std::env::args_os().skip(1))
        .spawn()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _logging = logging::init();

    let platform = match args.platform.as_deref() {
        None => Platform::current(),
        Some(name) => match Platform::from_str(name) {
            Some(p) => p,
            None => {
                eprintln!("markpad: unknown platform '{}'", name);
                return ExitCode::from(2);
            }
        },
    };

    match run(args, platform) {
        Ok(true) => {
            tracing::info!("relaunching after update");
            if let Err(e) = relaunch() {
                tracing::error!(error = %e, "relaunch failed");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            eprintln!("markpad: {}", e);
            ExitCode::FAILURE
        }
    }
}
