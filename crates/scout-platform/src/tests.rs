#[cfg(test)]
mod tests {
    use crate::llm::openai_compat::{build_request_body, parse_api_response, parse_model_list};
    use crate::llm::sse::{SseDecoder, TRUNCATED_STREAM, decode_stream, parse_chunk};
    use crate::llm::OpenAiCompatProvider;
    use crate::search::google::parse_results;
    use crate::storage::{FileStorage, MemoryStorage, open_storage};
    use futures::executor::block_on;
    use futures::stream::{self, StreamExt};
    use scout_core::ports::*;
    use scout_core::repository::DocumentRepository;
    use scout_types::config::{LlmConfig, StorageBackendType, StoreConfig};
    use scout_types::message::{Message, Role};
    use scout_types::session::{Session, Store};
    use scout_types::ScoutError;
    use serde_json::json;
    use std::rc::Rc;

    fn delta(s: &str) -> LlmStreamEvent {
        LlmStreamEvent::Delta(s.to_string())
    }

    // ─── SSE Decoder Tests ───────────────────────────────────

    #[test]
    fn test_sse_decodes_deltas_and_done() {
        let mut decoder = SseDecoder::new();
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let events = decoder.push(body.as_bytes());
        assert_eq!(events, vec![delta("Hel"), delta("lo"), LlmStreamEvent::Done]);
        assert!(decoder.is_finished());
    }

    #[test]
    fn test_sse_reassembles_split_chunks() {
        let mut decoder = SseDecoder::new();
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\r\n";
        let bytes = line.as_bytes();
        // split inside the multi-byte 'é'
        let cut = line.find('é').unwrap() + 1;

        assert!(decoder.push(&bytes[..cut]).is_empty());
        assert_eq!(decoder.push(&bytes[cut..]), vec![delta("héllo")]);
    }

    #[test]
    fn test_sse_ignores_comments_and_after_done() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(
            b": keep-alive\nevent: message\ndata: [DONE]\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        );
        assert_eq!(events, vec![LlmStreamEvent::Done]);
    }

    #[test]
    fn test_sse_error_payload() {
        assert_eq!(
            parse_chunk("{\"error\":{\"message\":\"rate limited\"}}"),
            Some(LlmStreamEvent::Error("rate limited".to_string()))
        );
        assert_eq!(parse_chunk("not json"), None);
        assert_eq!(parse_chunk("{\"choices\":[{\"delta\":{\"content\":\"\"}}]}"), None);
    }

    fn decode_body(chunks: Vec<Result<&'static str, String>>) -> Vec<LlmStreamEvent> {
        block_on(decode_stream(stream::iter(chunks)).collect::<Vec<_>>())
    }

    #[test]
    fn test_stream_ends_at_done() {
        let events = decode_body(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"Gold \"}}]}\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"rose.\"}}]}\ndata: [DONE]\n"),
        ]);
        assert_eq!(events, vec![delta("Gold "), delta("rose."), LlmStreamEvent::Done]);
    }

    #[test]
    fn test_stream_closed_before_done_is_error() {
        let events = decode_body(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"Gold \"}}]}\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"con"),
        ]);
        assert_eq!(
            events,
            vec![delta("Gold "), LlmStreamEvent::Error(TRUNCATED_STREAM.to_string())]
        );
        assert_eq!(
            decode_body(vec![]),
            vec![LlmStreamEvent::Error(TRUNCATED_STREAM.to_string())]
        );
    }

    #[test]
    fn test_stream_read_error_is_final() {
        let events = decode_body(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"Gold\"}}]}\n"),
            Err("connection reset".to_string()),
            Ok("data: [DONE]\n"),
        ]);
        assert_eq!(
            events,
            vec![delta("Gold"), LlmStreamEvent::Error("connection reset".to_string())]
        );
    }

    #[test]
    fn test_stream_deadline_outlasts_request_deadline() {
        let provider = OpenAiCompatProvider::new(&LlmConfig::default()).unwrap();
        assert_eq!(provider.request_timeout.as_secs(), 30);
        assert_eq!(provider.stream_timeout.as_secs(), 300);

        let config = LlmConfig {
            timeout_secs: 60,
            stream_timeout_secs: 10,
            ..LlmConfig::default()
        };
        let provider = OpenAiCompatProvider::new(&config).unwrap().with_api_key("sk-other");
        assert_eq!(provider.stream_timeout.as_secs(), 60);
    }

    // ─── OpenAI Payload Tests ────────────────────────────────

    #[test]
    fn test_build_request_body() {
        let req = ChatRequest {
            messages: vec![Message::system("sys"), Message::user("hi")],
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4000,
            temperature: 0.5,
        };
        let body = build_request_body(&req, false);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "sys"}));
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("stream").is_none());

        let streaming = build_request_body(&req, true);
        assert_eq!(streaming["stream"], true);
    }

    #[test]
    fn test_parse_api_response() {
        let data = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Prices rose."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }))
        .unwrap();
        let response = parse_api_response(data).unwrap();
        assert_eq!(response.message, Message::assistant("Prices rose."));
        assert_eq!(response.usage.unwrap().total_tokens, 15);

        let empty = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(parse_api_response(empty), Err(ScoutError::Llm(_))));
    }

    #[test]
    fn test_parse_model_list() {
        let data = json!({"data": [{"id": "gpt-4o"}, {"id": "gpt-4o-mini"}, {"object": "model"}]});
        assert_eq!(parse_model_list(&data), vec!["gpt-4o", "gpt-4o-mini"]);
        assert!(parse_model_list(&json!({})).is_empty());
    }

    // ─── Custom Search Payload Tests ─────────────────────────

    #[test]
    fn test_parse_search_results_in_order() {
        let body = r#"{"items": [
            {"link": "https://a.com/1", "snippet": "first", "title": "A"},
            {"link": "https://b.com/2"}
        ]}"#;
        let results = parse_results(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].link, "https://a.com/1");
        assert_eq!(results[0].snippet, "first");
        assert_eq!(results[1].snippet, "");
    }

    #[test]
    fn test_parse_search_without_items_is_empty() {
        let results = parse_results(r#"{"searchInformation": {"totalResults": "0"}}"#).unwrap();
        assert!(results.is_empty());
        assert!(matches!(parse_results("<html>"), Err(ScoutError::SearchUnavailable(_))));
    }

    // ─── Storage Tests ───────────────────────────────────────

    #[test]
    fn test_memory_storage_holds_transcript_document() {
        let storage = Rc::new(MemoryStorage::new());
        assert_eq!(block_on(storage.get("db")).unwrap(), None);

        let repo = DocumentRepository::new(storage.clone(), "db");
        let mut store = Store::default();
        store.sessions.push(Session::new("S1"));
        store.version = block_on(repo.save(&store)).unwrap();
        store.sessions.push(Session::new("S2"));
        assert_eq!(block_on(repo.save(&store)).unwrap(), 2);

        let loaded = block_on(repo.load()).unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.ids(), vec!["S1", "S2"]);
        assert_eq!(block_on(storage.get("other")).unwrap(), None);
    }

    #[test]
    fn test_file_storage_replaces_whole_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        assert_eq!(block_on(storage.get("db")).unwrap(), None);
        block_on(storage.set("db", b"first version, rather long")).unwrap();
        block_on(storage.set("db", b"v2")).unwrap();
        assert_eq!(block_on(storage.get("db")).unwrap(), Some(b"v2".to_vec()));

        // no temp files left behind
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["db.json"]);
    }

    #[test]
    fn test_file_storage_creates_nested_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("scout");
        let storage = FileStorage::open(&root).unwrap();
        block_on(storage.set("db", b"1")).unwrap();
        assert_eq!(std::fs::read(root.join("db.json")).unwrap(), b"1");
        assert_eq!(block_on(storage.get("backup")).unwrap(), None);
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert!(matches!(
            block_on(storage.set("../escape", b"x")),
            Err(ScoutError::InvalidInput(_))
        ));
        assert!(block_on(storage.get("")).is_err());
    }

    #[test]
    fn test_transcript_survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::default();
        let mut session = Session::seeded("S1", "sys");
        session.messages.push(Message::user("Tell me about X"));
        session.messages.push(Message::assistant("..."));
        store.sessions.push(session);

        {
            let repo = DocumentRepository::new(Rc::new(FileStorage::open(dir.path()).unwrap()), "db");
            assert_eq!(block_on(repo.save(&store)).unwrap(), 1);
        }

        let repo = DocumentRepository::new(Rc::new(FileStorage::open(dir.path()).unwrap()), "db");
        let loaded = block_on(repo.load()).unwrap();
        assert_eq!(loaded.version, 1);
        let roles: Vec<Role> = loaded.sessions[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);

        // a writer holding the old version is refused
        assert!(matches!(
            block_on(repo.save(&store)),
            Err(ScoutError::Conflict { expected: 0, found: 1 })
        ));
    }

    #[test]
    fn test_corrupt_document_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("db.json"), "{ not json").unwrap();
        let repo = DocumentRepository::new(Rc::new(FileStorage::open(dir.path()).unwrap()), "db");
        assert!(matches!(block_on(repo.load()), Err(ScoutError::Persistence(_))));
    }

    #[test]
    fn test_open_storage_backends() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig {
            backend: StorageBackendType::Memory,
            data_dir: dir.path().join("data").to_string_lossy().into_owned(),
            ..StoreConfig::default()
        };
        assert_eq!(open_storage(&config).unwrap().backend_name(), "memory");

        config.backend = StorageBackendType::Auto;
        assert_eq!(open_storage(&config).unwrap().backend_name(), "file");

        // a regular file where the directory should be
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "x").unwrap();
        config.data_dir = blocked.to_string_lossy().into_owned();
        assert_eq!(open_storage(&config).unwrap().backend_name(), "memory");

        config.backend = StorageBackendType::File;
        assert!(open_storage(&config).is_err());
    }
}
