use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use std::sync::Arc;
use std::time::Duration;

use streaming_asr_api::engine::mock::MockRecognizer;
use streaming_asr_api::session::StreamingCoordinator;

fn encode_chunk(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    BASE64_STANDARD.encode(bytes)
}

/// 2セッションが同時にプッシュしても、エンジン呼び出し区間は決して
/// 重ならない。後着のレイテンシには先行デコードの待ち時間が乗る。
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pushes_serialize_engine_access() {
    let engine = MockRecognizer::new(1600).with_decode_delay(Duration::from_millis(50));
    let coordinator = Arc::new(StreamingCoordinator::new(engine));

    let first_session = coordinator.start();
    let second_session = coordinator.start();
    let chunk = encode_chunk(&vec![0.5_f32; 1600]);

    let first_task = {
        let coordinator = Arc::clone(&coordinator);
        let chunk = chunk.clone();
        tokio::spawn(async move { coordinator.push(&first_session, &chunk, 16000).await.unwrap() })
    };

    // 先行プッシュがロックを掴むだけの猶予を与えてから後続を出す
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second_task = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.push(&second_session, &chunk, 16000).await.unwrap() })
    };

    let (first, second) = futures::future::join(first_task, second_task).await;
    let (first, second) = (first.unwrap(), second.unwrap());

    // デコード区間の非重複（直列化の検証）
    let mut spans = coordinator.engine().decode_spans();
    assert_eq!(spans.len(), 2);
    spans.sort_by_key(|span| span.0);
    assert!(
        spans[0].1 <= spans[1].0,
        "engine decode steps overlapped in time"
    );

    // それぞれ自身のデコード時間分はかかる
    assert!(first.latency_ms >= 50);
    assert!(second.latency_ms >= 50);

    // 後着側は残り待ち時間 + 自身のデコード時間を計上している
    let slower = first.latency_ms.max(second.latency_ms);
    assert!(
        slower >= 75,
        "waiting push reported latency {slower}ms, expected wait + decode"
    );
}

/// 空プッシュはデコード直列化リソースに並ばない。低速なデコードが
/// 走っている最中でも即座に返る。
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_push_skips_decode_queue() {
    let engine = MockRecognizer::new(1600).with_decode_delay(Duration::from_millis(100));
    let coordinator = Arc::new(StreamingCoordinator::new(engine));

    let busy_session = coordinator.start();
    let idle_session = coordinator.start();
    let chunk = encode_chunk(&vec![0.5_f32; 1600]);

    let busy_task = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.push(&busy_session, &chunk, 16000).await.unwrap() })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;

    // デコード中でもキープアライブは即応答
    let keepalive = coordinator.push(&idle_session, "", 16000).await.unwrap();
    assert_eq!(keepalive.latency_ms, 0);

    let busy = busy_task.await.unwrap();
    assert!(busy.latency_ms >= 100);
}
