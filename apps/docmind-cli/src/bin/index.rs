use std::{env, fs, path::PathBuf};

use docmind_cli::{collect_documents, doc_id_for, init_tracing, snapshot_file_name};
use docmind_core::config::Config;
use docmind_service::DocumentService;
use indicatif::{ProgressBar, ProgressStyle};

fn usage(prog: &str) -> ! {
    eprintln!("Usage: {prog} <file|dir> [--out DIR]");
    eprintln!("Example: {prog} ./manuals --out ./indexes");
    std::process::exit(1);
}

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;
    init_tracing(&settings.server.log_level);

    let mut args = env::args();
    let prog = args.next().unwrap_or_else(|| "docmind-index".to_string());
    let mut input = None;
    let mut out_dir = PathBuf::from("indexes");
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" | "-o" => match args.next() {
                Some(dir) => out_dir = PathBuf::from(dir),
                None => {
                    eprintln!("Error: --out requires a directory");
                    usage(&prog);
                }
            },
            "--help" | "-h" => usage(&prog),
            _ if !arg.starts_with('-') && input.is_none() => input = Some(PathBuf::from(arg)),
            other => {
                eprintln!("Error: unexpected argument '{other}'");
                usage(&prog);
            }
        }
    }
    let Some(input) = input else { usage(&prog) };

    let files = collect_documents(&input);
    if files.is_empty() {
        anyhow::bail!("no supported documents found at {}", input.display());
    }
    println!("Input: {}", input.display());
    println!("Snapshots: {}", out_dir.display());
    fs::create_dir_all(&out_dir)?;

    let service = DocumentService::from_config(&settings)?;
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("#>-"),
    );

    let (mut indexed, mut failed, mut chunks) = (0usize, 0usize, 0usize);
    for path in &files {
        let doc_id = doc_id_for(&input, path);
        pb.set_message(doc_id.clone());
        let result = fs::read(path)
            .map_err(docmind_core::error::Error::from)
            .and_then(|bytes| service.upload(&doc_id, &bytes))
            .and_then(|outcome| {
                let index = service.registry().get(&outcome.doc_id)?;
                index.save(&out_dir.join(snapshot_file_name(&outcome.doc_id)))?;
                service.registry().evict(&outcome.doc_id);
                Ok(outcome.chunks)
            });
        match result {
            Ok(n) => {
                indexed += 1;
                chunks += n;
            }
            Err(e) => {
                failed += 1;
                pb.suspend(|| eprintln!("Skipping {}: {e}", path.display()));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("\nIndexed {indexed} documents ({chunks} chunks), {failed} failed");
    println!("To ask a question: docmind-ask {}/<snapshot>.json '<query>'", out_dir.display());
    if indexed == 0 {
        anyhow::bail!("no documents could be indexed");
    }
    Ok(())
}
