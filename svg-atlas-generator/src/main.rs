/// SVG sprite sheet generator main entry point
mod atlas;
mod constants;
mod generator;
mod library;
mod packer;
mod renderer;
mod trim;

use crate::constants::DEFAULT_ID_PREFIX;
use crate::generator::AtlasGenerator;
use crate::library::LibraryProcessor;
use std::env;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let mut target: Option<String> = None;
    let mut prefix = DEFAULT_ID_PREFIX.to_string();
    let mut watch = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--watch" => watch = true,
            "--prefix" => {
                i += 1;
                match args.get(i) {
                    Some(value) => prefix = value.clone(),
                    None => usage(&args[0]),
                }
            }
            arg if target.is_none() && !arg.starts_with('-') => target = Some(arg.to_string()),
            _ => usage(&args[0]),
        }
        i += 1;
    }

    let Some(target) = target else { usage(&args[0]) };
    let path = Path::new(&target);
    let generator = AtlasGenerator::new(&prefix);

    if path.is_dir() {
        let processor = LibraryProcessor::new(generator);
        processor.process_all(path)?;
        if watch {
            processor.watch(path)?;
        }
    } else if path.is_file() {
        generator.process_file(path)?;
    } else {
        eprintln!("No such file or directory: {}", path.display());
        std::process::exit(1);
    }

    Ok(())
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <file.svg | directory> [--watch] [--prefix <prefix>]", program);
    std::process::exit(1);
}
