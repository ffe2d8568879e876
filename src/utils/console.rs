use crate::config::Config;
use tracing::info;
use colored::*;
use figlet_rs::FIGfont;

pub fn print_config(config: &Config) {
    // credentials are masked by the serializer
    let json = serde_json::to_string_pretty(config).unwrap_or_default();

    info!("\n{}: \n{}", String::from("[CONFIG]").blue().underline(), json.magenta());
}

fn print_banner(text: &str) {
    match FIGfont::standard() {
        Ok(font) =>
            match font.convert(text) {
                Some(figure) => info!("\n{}", figure),
                None => info!("{}", text),
            }
        Err(_) => info!("{}", text),
    }
}

pub fn print_app_starting() {
    print_banner("TRI-ARB is starting...");
}

pub fn print_app_started() {
    print_banner("TRI-ARB is STARTED!!!");
}
