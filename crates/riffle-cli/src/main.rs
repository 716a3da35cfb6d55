//! The Riffle shell: read statements, execute them against an in-process
//! database, print the results.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use riffle_engine::RiffleDB;

/// Interactive shell for the Riffle graph engine.
#[derive(Parser)]
#[command(name = "riffle", version, about)]
struct Args {
    /// Read statements from a file instead of stdin.
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let db = RiffleDB::new();

    match args.script {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("cannot open script {}", path.display()))?;
            run(&db, BufReader::new(file), false)
        }
        None => run(&db, io::stdin().lock(), true),
    }
}

fn run(db: &RiffleDB, input: impl BufRead, interactive: bool) -> Result<()> {
    if interactive {
        print!("riffle> ");
        io::stdout().flush()?;
    }
    for line in input.lines() {
        let line = line?;
        let statement = line.trim();
        if statement.is_empty() {
            if interactive {
                print!("riffle> ");
                io::stdout().flush()?;
            }
            continue;
        }
        if !statement.ends_with(';') {
            println!("ERROR: statements end with a semicolon");
        } else if statement == "exit;" {
            break;
        } else {
            match db.execute(statement) {
                Ok(output) => {
                    let rendered = output.to_string();
                    if !rendered.is_empty() {
                        println!("{rendered}");
                    }
                }
                Err(error) => println!("ERROR: {error}"),
            }
        }
        if interactive {
            print!("riffle> ");
            io::stdout().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_execution() {
        let db = RiffleDB::new();
        let script = b"CREATE (0)->(1),(1)->(2),(2)->(0);\n\nMATCH (a)->(b),(b)->(c),(c)->(a);\nexit;\nMATCH (a)->(b);\n" as &[u8];
        run(&db, script, false).unwrap();

        // Statements after exit; are not executed, but the ones before
        // were: the triangle is present.
        let result = db.execute("MATCH (a)->(b),(b)->(c),(c)->(a);").unwrap();
        assert_eq!(result.rows().len(), 3);
    }
}
