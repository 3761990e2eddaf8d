use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use std::time::Duration;

use streaming_asr_api::engine::mock::MockRecognizer;
use streaming_asr_api::session::{SessionError, StreamingCoordinator};

/// f32サンプル列をワイヤ形式（f32LEのbase64）へ
fn encode_chunk(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    BASE64_STANDARD.encode(bytes)
}

fn voiced(n: usize) -> Vec<f32> {
    vec![0.5; n]
}

#[tokio::test]
async fn lifecycle_ends_in_not_found() {
    let coordinator = StreamingCoordinator::new(MockRecognizer::new(1600));
    let session_id = coordinator.start();

    // 無音16000サンプル: 仮説は空のまま
    let silent = encode_chunk(&vec![0.0_f32; 16000]);
    let partial = coordinator.push(&session_id, &silent, 16000).await.unwrap();
    assert_eq!(partial.text, "");

    let final_transcript = coordinator.end(&session_id).await.unwrap();
    assert_eq!(final_transcript.text, "");

    // 終了後の識別子は永久に無効
    let err = coordinator.push(&session_id, &silent, 16000).await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound { .. }));
    let err = coordinator.end(&session_id).await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound { .. }));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let coordinator = StreamingCoordinator::new(MockRecognizer::new(1600));
    let err = coordinator
        .push("no-such-session", &encode_chunk(&voiced(1600)), 16000)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotFound { .. }));
}

#[tokio::test]
async fn empty_push_never_touches_engine() {
    let coordinator = StreamingCoordinator::new(MockRecognizer::new(1600));
    let session_id = coordinator.start();

    let partial = coordinator.push(&session_id, "", 16000).await.unwrap();
    assert_eq!(partial.text, "");
    assert_eq!(partial.latency_ms, 0);
    assert_eq!(coordinator.engine().engine_calls(), 0);
}

#[tokio::test]
async fn misaligned_payload_does_not_poison_session() {
    let coordinator = StreamingCoordinator::new(MockRecognizer::new(1600));
    let session_id = coordinator.start();

    // 4の倍数でない6バイト
    let bad = BASE64_STANDARD.encode([1_u8, 2, 3, 4, 5, 6]);
    let err = coordinator.push(&session_id, &bad, 16000).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidPayload { .. }));

    // 同じセッションへの正常なプッシュは引き続き通る
    let ok = coordinator
        .push(&session_id, &encode_chunk(&voiced(3200)), 16000)
        .await
        .unwrap();
    assert_eq!(ok.text, "seg0 seg1");
}

#[tokio::test]
async fn invalid_base64_is_rejected() {
    let coordinator = StreamingCoordinator::new(MockRecognizer::new(1600));
    let session_id = coordinator.start();

    let err = coordinator
        .push(&session_id, "!!not-base64!!", 16000)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidPayload { .. }));
    assert!(err.to_string().contains("invalid base64"));
}

#[tokio::test]
async fn partial_text_extends_monotonically() {
    let coordinator = StreamingCoordinator::new(MockRecognizer::new(1600));
    let session_id = coordinator.start();

    let first = coordinator
        .push(&session_id, &encode_chunk(&voiced(3200)), 16000)
        .await
        .unwrap();
    let second = coordinator
        .push(&session_id, &encode_chunk(&voiced(3200)), 16000)
        .await
        .unwrap();

    assert!(second.text.len() >= first.text.len());
    assert!(second.text.starts_with(&first.text));
}

#[tokio::test]
async fn latency_covers_decode_time() {
    let engine = MockRecognizer::new(1600).with_decode_delay(Duration::from_millis(50));
    let coordinator = StreamingCoordinator::new(engine);
    let session_id = coordinator.start();

    let partial = coordinator
        .push(&session_id, &encode_chunk(&voiced(1600)), 16000)
        .await
        .unwrap();
    // 1ウィンドウ分のデコードに50msかかる設定なのでそれ以上
    assert!(partial.latency_ms >= 50);
}

#[tokio::test]
async fn engine_failure_leaves_session_registered() {
    let engine = MockRecognizer::new(1600).with_decode_failure();
    let coordinator = StreamingCoordinator::new(engine);
    let session_id = coordinator.start();

    let err = coordinator
        .push(&session_id, &encode_chunk(&voiced(1600)), 16000)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Engine(_)));

    // 失敗してもレジストリからは消えない。後始末はクライアントの end 任せ
    assert_eq!(coordinator.active_sessions(), 1);

    let err = coordinator.end(&session_id).await.unwrap_err();
    assert!(matches!(err, SessionError::Engine(_)));
    assert_eq!(coordinator.active_sessions(), 0);
}

#[tokio::test]
async fn warm_up_does_not_register_sessions() {
    let coordinator = StreamingCoordinator::new(MockRecognizer::new(1600));
    coordinator.warm_up(16000).await.unwrap();

    assert_eq!(coordinator.active_sessions(), 0);
    // 無音1秒が確かにエンジンを通過している
    assert!(coordinator.engine().engine_calls() > 0);
}
