use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;

use docmind_answer::prompt::{selection_prompt, user_message, SYSTEM_PROMPT};
use docmind_answer::{synthesizer_from_config, ChatProvider, ChatSynthesizer};
use docmind_core::config::{SynthesizerBackend, SynthesizerConfig};
use docmind_core::error::Error;
use docmind_core::traits::Synthesizer;

fn serve_once(status: &'static str, body: String) -> (String, thread::JoinHandle<(String, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}/v1/chat/completions", listener.local_addr().expect("addr"));
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut headers = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("header line");
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = v.trim().parse().expect("length");
            }
            headers.push_str(&line);
        }
        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).expect("body");
        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
        .expect("write");
        (headers, String::from_utf8(request_body).expect("utf8"))
    });
    (url, handle)
}

fn chat_config(url: String) -> SynthesizerConfig {
    SynthesizerConfig {
        backend: SynthesizerBackend::Groq,
        api_url: Some(url),
        timeout_secs: 5,
        ..SynthesizerConfig::default()
    }
}

#[test]
fn sends_system_and_user_messages() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"Boil it for one minute."}}]}"#;
    let (url, server) = serve_once("200 OK", body.to_string());
    let synth = ChatSynthesizer::with_api_key(ChatProvider::Groq, &chat_config(url), "secret".into()).expect("synth");

    let answer = synth.generate("How do I purify water?", "Boil water for one minute.").expect("answer");
    assert_eq!(answer, "Boil it for one minute.");

    let (headers, request) = server.join().expect("server");
    assert!(headers.to_ascii_lowercase().contains("authorization: bearer secret"));
    let request: serde_json::Value = serde_json::from_str(&request).expect("json");
    assert_eq!(request["model"], "mixtral-8x7b-32768");
    assert_eq!(request["temperature"], 0.0);
    assert_eq!(request["messages"][0]["content"], SYSTEM_PROMPT);
    assert_eq!(
        request["messages"][1]["content"],
        "Context: Boil water for one minute.\n\nQuestion: How do I purify water?"
    );
}

#[test]
fn openai_uses_its_default_model() {
    let body = r#"{"choices":[{"message":{"content":"ok"}}]}"#;
    let (url, server) = serve_once("200 OK", body.to_string());
    let synth = ChatSynthesizer::with_api_key(ChatProvider::OpenAi, &chat_config(url), "k".into()).expect("synth");
    assert_eq!(synth.name(), "openai");
    synth.generate("q", "c").expect("answer");
    let (_, request) = server.join().expect("server");
    let request: serde_json::Value = serde_json::from_str(&request).expect("json");
    assert_eq!(request["model"], "gpt-3.5-turbo");
}

#[test]
fn upstream_error_is_a_synthesis_error() {
    let (url, server) = serve_once("429 Too Many Requests", r#"{"error":"rate limited"}"#.to_string());
    let synth = ChatSynthesizer::with_api_key(ChatProvider::Groq, &chat_config(url), "k".into()).expect("synth");
    let err = synth.generate("q", "c").expect_err("429");
    assert!(matches!(err, Error::Synthesis(ref m) if m.contains("429")), "{err}");
    server.join().expect("server");
}

#[test]
fn empty_choices_is_a_synthesis_error() {
    let (url, server) = serve_once("200 OK", r#"{"choices":[]}"#.to_string());
    let synth = ChatSynthesizer::with_api_key(ChatProvider::Groq, &chat_config(url), "k".into()).expect("synth");
    assert!(matches!(synth.generate("q", "c"), Err(Error::Synthesis(_))));
    server.join().expect("server");
}

#[test]
fn missing_api_key_fails_at_construction() {
    let cfg = SynthesizerConfig {
        backend: SynthesizerBackend::OpenAi,
        api_key_env: Some("DOCMIND_TEST_UNSET_CHAT_KEY".into()),
        ..SynthesizerConfig::default()
    };
    let err = synthesizer_from_config(&cfg).err().expect("missing key");
    assert!(matches!(err, Error::Configuration(ref m) if m.contains("DOCMIND_TEST_UNSET_CHAT_KEY")), "{err}");
}

#[test]
fn default_backend_is_extractive() {
    let synth = synthesizer_from_config(&SynthesizerConfig::default()).expect("synth");
    assert_eq!(synth.name(), "extractive");
}

#[test]
fn prompt_templates() {
    assert_eq!(user_message("q", "ctx"), "Context: ctx\n\nQuestion: q");
    assert_eq!(
        selection_prompt("sel", "summarize", "doc"),
        "Selected text: sel\n\nTask: summarize\n\nOverall Document Context: doc"
    );
}
