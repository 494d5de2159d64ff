use clap::Parser;
use client::network::Client;
use log::info;
use macroquad::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "3D Tennis".to_owned(),
        window_width: 1024,
        window_height: 600,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: arrow keys to move, Space to serve, Escape to quit");

    let mut client = match Client::new(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to start client: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        client.frame();
        next_frame().await;
    }

    client.shutdown();
}
