use log::{debug, info};
use std::env;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use tlkative::compressed_words::CompressedWordTable;
use tlkative::talk_files::TalkScripts;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    // Display help information if not enough arguments were provided
    // Exit with success status since the user is asking for help
    if args.len() < 3 {
        println!("tlkative - talk script decoder for Ultima V .TLK files");
        println!();
        println!("Usage: {} <words_file> <talk_file> [npc_index]", args[0]);
        println!("Examples:");
        println!("  {} resources/WORDS.TXT CASTLE.TLK", args[0]);
        println!("  {} resources/WORDS.TXT CASTLE.TLK 3", args[0]);
        println!();
        println!("The words file holds the compressed word list, one word per");
        println!("line, in on-disk order. When an NPC index is given only that");
        println!("script is printed, otherwise every script in the file is.");
        return Ok(());
    }

    let words_path = &args[1];
    let talk_path = &args[2];
    let npc_filter = match args.get(3) {
        Some(raw) => Some(
            raw.parse::<u16>()
                .map_err(|_| format!("Invalid NPC index: {}", raw))?,
        ),
        None => None,
    };

    debug!("Loading compressed words: {}", words_path);
    let words: Vec<String> = String::from_utf8_lossy(&read_file(words_path))
        .lines()
        .map(str::to_string)
        .collect();
    info!("{} compressed words", words.len());

    debug!("Loading talk file: {}", talk_path);
    let talk_bytes = read_file(talk_path);

    let map_name = Path::new(talk_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| talk_path.clone());

    let mut scripts = TalkScripts::new(CompressedWordTable::new(words));
    let loaded = scripts.load_talk_file(&map_name, &talk_bytes)?;
    info!("{}: {} scripts decoded", map_name, loaded);

    for npc in scripts.npc_indexes(&map_name) {
        if npc_filter.map_or(false, |wanted| wanted != npc) {
            continue;
        }
        if let Some(script) = scripts.talk_script(&map_name, npc) {
            println!("----- {} NPC #{} -----", map_name, npc);
            println!("{}", script);
        }
    }

    Ok(())
}

/// Read a whole file with user-friendly error handling
/// Use an explicit match instead of the ? operator to provide clean,
/// formatted messages that guide users past common problems like wrong
/// paths or running from the wrong directory
fn read_file(path: &str) -> Vec<u8> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            match e.kind() {
                std::io::ErrorKind::NotFound => {
                    eprintln!("Error: File not found: {}", path);
                    eprintln!();
                    eprintln!("Please check:");
                    eprintln!("• File path is correct");
                    eprintln!("• You're running from the right directory");
                    eprintln!("• File exists and is readable");
                }
                std::io::ErrorKind::PermissionDenied => {
                    eprintln!("Error: Permission denied accessing file: {}", path);
                    eprintln!();
                    eprintln!("Please check file permissions.");
                }
                _ => {
                    eprintln!("Error: Cannot open file '{}': {}", path, e);
                }
            }
            std::process::exit(1);
        }
    };

    let mut bytes = Vec::new();
    if let Err(e) = file.read_to_end(&mut bytes) {
        eprintln!("Error: Cannot read file '{}': {}", path, e);
        std::process::exit(1);
    }
    bytes
}
