use getopts::Options;
use hotstatsd::{BackgroundSink, Configuration, JsonSink, LogSink, Sink};
use log::{error, info};
use std::{
    env,
    io,
    net::{IpAddr, SocketAddr},
    process,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn request_stop(_: libc::c_int) { STOP_REQUESTED.store(true, Ordering::SeqCst); }

/// Routes SIGINT and SIGTERM into `STOP_REQUESTED`.
fn install_signal_handlers() -> io::Result<()> {
    let handler = request_stop as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for &signal in &[libc::SIGINT, libc::SIGTERM] {
        // The handler only touches an atomic, which is async-signal-safe.
        if unsafe { libc::signal(signal, handler) } == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

pub fn opts() -> Options {
    let mut opts = Options::new();

    opts.optopt("H", "host", "address to listen on (default 127.0.0.1)", "ADDR");
    opts.optopt("p", "port", "port to listen on (default 8125)", "INTEGER");
    opts.optopt("i", "interval", "flush interval in seconds (default 60)", "INTEGER");
    opts.optopt("n", "namespace", "root namespace (default Statsd)", "NAME");
    opts.optflag("j", "json", "write flushed records to stdout as JSON lines");
    opts.optflag("d", "debug", "enable debug logging");
    opts.optflag("h", "help", "print this help menu");

    opts
}

fn parse_opt<T: std::str::FromStr>(value: Option<String>, default: T, name: &str) -> T {
    match value {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                error!("invalid value for --{}: {}", name, raw);
                process::exit(2);
            },
        },
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = &args[0];
    let opts = opts();

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            eprintln!("Failed to parse command line args: {}", f);
            process::exit(2);
        },
    };

    if matches.opt_present("help") {
        print_usage(program, &opts);
        return;
    }

    let level = if matches.opt_present("debug") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let host: IpAddr = parse_opt(matches.opt_str("host"), IpAddr::from([127, 0, 0, 1]), "host");
    let port: u16 = parse_opt(matches.opt_str("port"), 8125, "port");
    let interval: u64 = parse_opt(matches.opt_str("interval"), 60, "interval");
    let namespace = matches.opt_str("namespace").unwrap_or_else(|| "Statsd".to_owned());

    info!("hotstatsd");
    info!("flush interval: {}s", interval);
    info!("namespace: {}", namespace);

    let conf = Configuration::new()
        .listen(SocketAddr::new(host, port))
        .flush_interval(Duration::from_secs(interval))
        .namespace(&namespace);

    let sink: Box<dyn Sink + Send> = if matches.opt_present("json") {
        Box::new(JsonSink::new(io::stdout()))
    } else {
        Box::new(LogSink)
    };

    let sink = match BackgroundSink::spawn(sink, 4096) {
        Ok(sink) => sink,
        Err(e) => {
            error!("failed to start publisher: {}", e);
            process::exit(1);
        },
    };

    let receiver = match conf.build(sink) {
        Ok(receiver) => receiver,
        Err(e) => {
            error!("failed to start receiver on {}:{}: {}", host, port, e);
            process::exit(1);
        },
    };

    if let Err(e) = install_signal_handlers() {
        error!("failed to install signal handlers: {}", e);
        process::exit(1);
    }
    if let Err(e) = receiver.get_controller().stop_when(&STOP_REQUESTED) {
        error!("failed to start shutdown watcher: {}", e);
        process::exit(1);
    }

    // Dropping the returned sink waits for queued records to be published.
    let sink = receiver.run();
    drop(sink);
    info!("shut down");
}
