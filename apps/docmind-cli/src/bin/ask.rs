use std::{env, fs, path::PathBuf};

use docmind_core::config::Config;
use docmind_index::DocumentIndex;
use docmind_service::DocumentService;

fn usage(prog: &str) -> ! {
    eprintln!("Usage: {prog} <file|snapshot.json> <query> [--k N]");
    eprintln!("Example: {prog} indexes/water.pdf.json 'how do I clean the filter?' --k 5");
    std::process::exit(1);
}

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let mut settings = config.settings()?;
    docmind_cli::init_tracing(&settings.server.log_level);

    let mut args = env::args();
    let prog = args.next().unwrap_or_else(|| "docmind-ask".to_string());
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--k" | "-k" => match args.next().and_then(|v| v.parse::<usize>().ok()) {
                Some(k) if k > 0 => settings.retrieval.top_k = k,
                _ => {
                    eprintln!("Error: --k requires a positive number");
                    usage(&prog);
                }
            },
            "--help" | "-h" => usage(&prog),
            _ => positional.push(arg),
        }
    }
    let [source, query] = <[String; 2]>::try_from(positional).unwrap_or_else(|_| usage(&prog));
    let source = PathBuf::from(source);

    let service = DocumentService::from_config(&settings)?;
    let is_snapshot = source.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let doc_id = if is_snapshot {
        let index = DocumentIndex::load(&source)?;
        let doc_id = index.doc_id().to_string();
        service.registry().register(doc_id.clone(), index)?;
        doc_id
    } else {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("{} is not a file", source.display()))?;
        let bytes = fs::read(&source)?;
        service.upload(&name, &bytes)?.doc_id
    };

    let k = service.top_k();
    println!("Document: {doc_id}");
    println!("Query: {query}");
    let answer = service.answer(&doc_id, &query)?;
    println!("\nTop {k} passages:\n------------------");
    println!("{}", if answer.context.is_empty() { "(none)" } else { answer.context.as_str() });
    println!("\nAnswer ({}):\n------------------\n{}", service.synthesizer_name(), answer.response);
    Ok(())
}
