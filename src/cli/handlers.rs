use crate::{
    cli::StatsFormat,
    error::{CompilerError, Result},
    RenderStats,
};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Instant;

// --- COMPILE ---
pub fn handle_compile_command(cli: &super::Cli, matches: &clap::ArgMatches) -> Result<()> {
    let input = matches.get_one::<String>("input").unwrap();
    let input_path = Path::new(input);

    if input_path.is_dir() {
        return compile_directory(cli, matches, input_path);
    }

    let output = matches
        .get_one::<String>("output")
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            input_path
                .with_extension("css")
                .to_string_lossy()
                .into_owned()
        });

    if matches.get_flag("watch") {
        watch_and_compile(cli, matches, input, &output)
    } else {
        compile_single_file(cli, matches, input, &output).map(|_| ())
    }
}

fn read_dir_of(input: &str) -> &Path {
    let parent = Path::new(input).parent().unwrap_or(Path::new("."));
    if parent == Path::new("") {
        Path::new(".")
    } else {
        parent
    }
}

fn compile_single_file(
    cli: &super::Cli,
    matches: &clap::ArgMatches,
    input: &str,
    output: &str,
) -> Result<RenderStats> {
    println!("🔨 Compiling {} -> {}", input, output);

    let stylus = cli.build_engine(matches, read_dir_of(input))?;
    let source = fs::read_to_string(input).map_err(|_| CompilerError::FileNotFound {
        path: input.to_string(),
    })?;

    let compile_start = Instant::now();
    let (css, stats) = stylus.render_with_stats(&source)?;
    let compile_time = compile_start.elapsed();
    fs::write(output, css.unwrap_or_default())?;

    println!("✅ Compilation successful!");
    println!("   Output: {} bytes", stats.output_size);
    println!("   Time: {:.2}ms", compile_time.as_millis());

    if matches.get_flag("stats") {
        match matches.get_one::<StatsFormat>("stats-format").unwrap() {
            StatsFormat::Json => {
                let json =
                    serde_json::to_string_pretty(&stats).map_err(|e| CompilerError::InvalidFormat {
                        message: format!("JSON serialization error: {}", e),
                    })?;
                println!("{}", json);
            }
            StatsFormat::Text => print_detailed_stats(&stats),
        }
    }

    Ok(stats)
}

fn compile_directory(cli: &super::Cli, matches: &clap::ArgMatches, dir: &Path) -> Result<()> {
    let out_dir = matches
        .get_one::<String>("out-dir")
        .cloned()
        .or_else(|| cli.output_directory().cloned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned());
    let overwrite = matches.get_flag("overwrite") || cli.overwrite_default();

    let mut stylus = cli.build_engine(matches, dir)?;
    stylus.set_write_dir(&out_dir)?;

    let written = stylus.parse_files(overwrite)?;
    println!("✅ Compiled {} file(s) into {}", written, out_dir);
    Ok(())
}

fn watch_and_compile(
    cli: &super::Cli,
    matches: &clap::ArgMatches,
    input: &str,
    output: &str,
) -> Result<()> {
    println!("👀 Watching {} for changes...", input);

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                if let Err(e) = tx.send(event) {
                    eprintln!("Watch error: {}", e);
                }
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| {
        CompilerError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to create file watcher: {}", e),
        ))
    })?;

    watcher
        .watch(Path::new(input), RecursiveMode::NonRecursive)
        .map_err(|e| {
            CompilerError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to watch file: {}", e),
            ))
        })?;

    if let Err(e) = compile_single_file(cli, matches, input, output) {
        eprintln!("❌ Initial compilation failed: {}", e);
    }

    loop {
        match rx.recv() {
            Ok(_event) => {
                println!("🔄 File changed, recompiling...");
                match compile_single_file(cli, matches, input, output) {
                    Ok(stats) => {
                        println!(
                            "✅ Recompiled successfully ({} bytes, {}ms)",
                            stats.output_size, stats.render_time_ms
                        );
                    }
                    Err(e) => eprintln!("❌ Compilation failed: {}", e),
                }
            }
            Err(e) => {
                eprintln!("Watch error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

// --- CHECK ---
pub fn handle_check_command(matches: &clap::ArgMatches) -> Result<()> {
    let input = matches.get_one::<String>("input").unwrap();
    let recursive = matches.get_flag("recursive");

    if recursive && Path::new(input).is_dir() {
        check_directory_recursive(input)
    } else {
        check_single_file(input)
    }
}

fn check_single_file(input: &str) -> Result<()> {
    println!("🔍 Checking {}", input);
    let source = fs::read_to_string(input).map_err(|_| CompilerError::FileNotFound {
        path: input.to_string(),
    })?;
    match crate::render_source(&source, read_dir_of(input)) {
        Ok(_) => {
            println!("✅ {} - No issues found", input);
            Ok(())
        }
        Err(e) => {
            println!("❌ {} - {}", input, e);
            Err(e)
        }
    }
}

fn check_directory_recursive(dir_path: &str) -> Result<()> {
    let mut total_files = 0;
    let mut error_files = 0;

    for entry in walkdir::WalkDir::new(dir_path) {
        let entry = entry.map_err(|e| {
            CompilerError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Directory traversal error: {}", e),
            ))
        })?;
        if entry.file_type().is_file() {
            if let Some(ext) = entry.path().extension() {
                if ext == "styl" {
                    total_files += 1;
                    if check_single_file(&entry.path().to_string_lossy()).is_err() {
                        error_files += 1;
                    }
                }
            }
        }
    }

    println!("\n📊 Check Summary:");
    println!("   Total files: {}", total_files);
    println!("   Files with errors: {}", error_files);
    if total_files > 0 {
        println!(
            "   Success rate: {:.1}%",
            (total_files - error_files) as f64 / total_files as f64 * 100.0
        );
    }

    if error_files > 0 {
        Err(CompilerError::InvalidFormat {
            message: format!("{} files have errors", error_files),
        })
    } else {
        Ok(())
    }
}

// --- HELPERS ---
fn print_detailed_stats(stats: &RenderStats) {
    println!("\n📊 Detailed Render Statistics:");
    println!("   Source size: {} bytes", stats.source_size);
    println!("   Output size: {} bytes", stats.output_size);
    println!("   Render time: {}ms", stats.render_time_ms);
    println!("\n   Breakdown:");
    println!("     Blocks: {}", stats.block_count);
    println!("     Variables: {}", stats.variable_count);
    println!("     Functions: {}", stats.function_count);
    if stats.import_count > 0 {
        println!("     Imports: {}", stats.import_count);
    }
}
