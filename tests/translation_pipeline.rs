//! 翻译管道集成测试
//!
//! 覆盖收集、分批、顺序提交、增量刷新、取消和恢复的端到端行为

use std::time::Duration;

use dom_translate::parsers::html::text_content;
use dom_translate::translation::{
    constants, LanguageStore, Origin, PageHarvester, RunState, RunStatus, TranslationConfig, TranslationEvent,
};
use tokio::sync::broadcast;
use tokio::task::LocalSet;

mod common {
    include!("common/mod.rs");
}

use common::{mock_adapter, page_translator, test_config, HtmlTestHelper, MockBehavior, MockRemote};

/// 等待指定批次完成的事件
async fn wait_for_batch(events: &mut broadcast::Receiver<TranslationEvent>, index: usize) {
    loop {
        if let TranslationEvent::BatchCompleted { batch_index, .. } = events.recv().await.unwrap() {
            if batch_index == index {
                return;
            }
        }
    }
}

#[test]
fn test_harvest_is_idempotent() {
    let dom = dom_translate::parsers::html_to_dom(
        HtmlTestHelper::marketplace_page().as_bytes(),
        "utf-8",
    );
    let harvester = PageHarvester::default();

    let first = harvester.harvest(&dom.document);
    let second = harvester.harvest(&dom.document);

    let sources: Vec<&str> = first.iter().map(|u| u.source_text.as_str()).collect();
    assert_eq!(
        sources,
        vec![
            "Catálogo",
            "Favoritos",
            "Bienvenido",
            "Precio",
            "Fecha",
            "Todos los derechos reservados"
        ]
    );
    assert_eq!(first.len(), second.len(), "Re-harvest should find the same units");

    let mut indices = HtmlTestHelper::attr_values(&dom.document, constants::TRANSLATE_INDEX_ATTR);
    indices.sort();
    assert_eq!(indices, vec!["0", "1", "2", "3", "4", "5"], "No duplicated index tags");
    assert_eq!(
        HtmlTestHelper::attr_values(&dom.document, constants::ORIGINAL_TEXT_ATTR).len(),
        6
    );
    assert!(second.iter().all(|u| u.is_alive()), "No orphan units");
}

#[tokio::test]
async fn test_round_trip_restores_identical_text() {
    LocalSet::new()
        .run_until(async {
            let config = test_config();
            let remote = MockRemote::new(MockBehavior::Echo);
            let adapter = mock_adapter(&remote, &config);
            let (mut translator, dom, store) =
                page_translator(&HtmlTestHelper::marketplace_page(), adapter, config);
            let before = text_content(&dom.document);

            let report = translator.change_language("en").unwrap().wait().await.unwrap();
            assert_eq!(report.status, RunStatus::Completed);
            assert_eq!(report.total_units, 6);
            assert_eq!(report.count_origin(Origin::Remote), 6);
            assert_eq!(
                HtmlTestHelper::texts_of(&dom.document, "h1"),
                vec!["[en] Bienvenido"]
            );
            assert_eq!(
                HtmlTestHelper::texts_of(&dom.document, "p"),
                vec!["Marca Registrada"],
                "Opted-out elements must not change"
            );

            let restored = translator.change_language("es").unwrap().wait().await.unwrap();
            assert_eq!(restored.status, RunStatus::Restored);
            assert_eq!(text_content(&dom.document), before);
            assert!(
                HtmlTestHelper::attr_values(&dom.document, constants::TRANSLATE_INDEX_ATTR)
                    .is_empty(),
                "Restore clears index tags"
            );
            assert_eq!(store.load().unwrap().as_deref(), Some("es"));
            assert_eq!(remote.calls(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_switching_languages_translates_from_original() {
    LocalSet::new()
        .run_until(async {
            let config = test_config();
            let remote = MockRemote::new(MockBehavior::Echo);
            let adapter = mock_adapter(&remote, &config);
            let (mut translator, dom, _) =
                page_translator("<h1>Bienvenido</h1>", adapter, config);

            translator.change_language("en").unwrap().wait().await.unwrap();
            translator.change_language("fr").unwrap().wait().await.unwrap();

            assert_eq!(
                HtmlTestHelper::texts_of(&dom.document, "h1"),
                vec!["[fr] Bienvenido"]
            );
            assert_eq!(remote.requests()[1], vec!["Bienvenido".to_string()]);
        })
        .await;
}

#[tokio::test]
async fn test_45_units_are_sent_as_30_and_15_in_order() {
    LocalSet::new()
        .run_until(async {
            let config = test_config();
            let remote = MockRemote::new(MockBehavior::Echo);
            let adapter = mock_adapter(&remote, &config);
            let (mut translator, dom, _) =
                page_translator(&HtmlTestHelper::numbered_page(45), adapter, config);

            let report = translator.change_language("en").unwrap().wait().await.unwrap();

            let requests = remote.requests();
            assert_eq!(requests.len(), 2);
            assert_eq!(requests[0].len(), 30);
            assert_eq!(requests[1].len(), 15);
            assert_eq!(requests[0][0], "Elemento número 0");
            assert_eq!(requests[1][0], "Elemento número 30");

            assert_eq!(report.total_batches, 2);
            assert_eq!(report.written, 45);
            let indices: Vec<usize> = report.outcomes.iter().map(|o| o.index).collect();
            assert_eq!(indices, (0..45).collect::<Vec<_>>());

            let texts = HtmlTestHelper::texts_of(&dom.document, "p");
            for (i, text) in texts.iter().enumerate() {
                assert_eq!(text, &format!("[en] Elemento número {i}"));
            }
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_results_are_flushed_incrementally() {
    LocalSet::new()
        .run_until(async {
            let config = TranslationConfig {
                batch_size: 2,
                ..test_config()
            };
            let remote = MockRemote::new(MockBehavior::Slow(Duration::from_secs(1)));
            let adapter = mock_adapter(&remote, &config);
            let (mut translator, dom, _) =
                page_translator(&HtmlTestHelper::numbered_page(5), adapter, config);
            let mut events = translator.subscribe();

            let handle = translator.change_language("en").unwrap();

            wait_for_batch(&mut events, 0).await;
            let texts = HtmlTestHelper::texts_of(&dom.document, "p");
            assert_eq!(texts[0], "[en] Elemento número 0");
            assert_eq!(texts[1], "[en] Elemento número 1");
            assert_eq!(texts[2], "Elemento número 2");
            assert_eq!(translator.state(), RunState::Translating(1));

            // 奇数批次之后不刷新
            wait_for_batch(&mut events, 1).await;
            let texts = HtmlTestHelper::texts_of(&dom.document, "p");
            assert_eq!(texts[2], "Elemento número 2");
            assert_eq!(texts[3], "Elemento número 3");

            let report = handle.wait().await.unwrap();
            assert_eq!(report.total_batches, 3);
            assert_eq!(report.written, 5);
            assert!(HtmlTestHelper::texts_of(&dom.document, "p")
                .iter()
                .all(|t| t.starts_with("[en] ")));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_stale_run_never_writes() {
    LocalSet::new()
        .run_until(async {
            let config = test_config();
            let remote = MockRemote::new(MockBehavior::Slow(Duration::from_secs(5)));
            let adapter = mock_adapter(&remote, &config);
            let (mut translator, dom, _) =
                page_translator(&HtmlTestHelper::numbered_page(3), adapter, config);
            let mut events = translator.subscribe();

            let first = translator.change_language("en").unwrap();
            let first_id = first.run_id();

            // 让第一次运行发出请求
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert_eq!(remote.calls(), 1);

            let second = translator.change_language("fr").unwrap();
            assert!(first.wait().await.is_none(), "Cancelled run yields no report");

            let report = second.wait().await.unwrap();
            assert_eq!(report.language, "fr");
            assert_eq!(translator.state(), RunState::Done);

            let texts = HtmlTestHelper::texts_of(&dom.document, "p");
            assert!(texts.iter().all(|t| t.starts_with("[fr] ")));
            assert!(!texts.iter().any(|t| t.contains("[en]")));

            let mut seen = Vec::new();
            while let Ok(event) = events.try_recv() {
                seen.push(event);
            }
            assert!(seen.contains(&TranslationEvent::RunCancelled { run_id: first_id }));
            assert!(!seen.iter().any(|e| matches!(
                e,
                TranslationEvent::BatchCompleted { run_id, .. } if *run_id == first_id
            )));
        })
        .await;
}

#[tokio::test]
async fn test_disabled_translation_only_restores() {
    LocalSet::new()
        .run_until(async {
            let config = TranslationConfig {
                enabled: false,
                ..test_config()
            };
            let remote = MockRemote::new(MockBehavior::Echo);
            let adapter = mock_adapter(&remote, &config);
            let (mut translator, dom, _) = page_translator("<p>Precio</p>", adapter, config);

            let report = translator.change_language("en").unwrap().wait().await.unwrap();
            assert_eq!(report.status, RunStatus::Restored);
            assert_eq!(HtmlTestHelper::texts_of(&dom.document, "p"), vec!["Precio"]);
            assert_eq!(remote.calls(), 0);
        })
        .await;
}
