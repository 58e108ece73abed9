//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config, command) = match photojournal_app::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}\n\n{}", e, photojournal_app::USAGE);
            std::process::exit(2);
        }
    };
    log::info!("Starting Photo Journal");

    let result = photojournal_app::App::open(&config)
        .and_then(|mut app| pollster::block_on(app.execute(&command)));
    match result {
        Ok(output) => print!("{}", output),
        Err(e) => {
            log::error!("{:?}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
