//! COEIROINK adapter: combined style ids against a fake engine.

mod common;

use std::sync::Arc;

use common::Calls;
use jptts::{combined_id, Backend, Coeiroink, Error, ServiceConfig};

async fn coeiroink(count: usize) -> (Coeiroink, Arc<Calls>) {
    let (url, calls) = common::coeiroink(count).await;
    (Coeiroink::new(ServiceConfig::default().base_url(url)).unwrap(), calls)
}

#[tokio::test]
async fn test_catalog_uses_combined_ids() {
    let (ci, calls) = coeiroink(3).await;
    assert!(ci.check_availability().await);

    let catalog = ci.fetch_speakers(false).await.unwrap();
    assert_eq!(catalog.len(), 3);

    let styles: Vec<_> = catalog.get(&common::coeiroink_uuid(2)).unwrap().styles.iter().map(|s| s.id.clone()).collect();
    assert_eq!(styles, vec!["120", "1212"]);
    assert_eq!(Calls::count(&calls.speakers), 1);
}

#[tokio::test]
async fn test_every_style_reaches_its_speaker() {
    // eleven speakers: the index takes two digits
    let (ci, calls) = coeiroink(11).await;
    let catalog = ci.fetch_speakers(false).await.unwrap();

    let mut expected = Vec::new();
    for (i, speaker) in catalog.iter().enumerate() {
        assert_eq!(speaker.id, common::coeiroink_uuid(i));
        for (style, native) in speaker.styles.iter().zip(common::coeiroink_styles(i)) {
            let decoded = combined_id::decode(&style.id, catalog.len()).unwrap();
            assert_eq!((decoded.index, decoded.style_id), (i, native));

            ci.synthesize("テスト", &speaker.id, Some(&style.id)).await.unwrap();
            expected.push(format!("{}/{}", speaker.id, native));
        }
    }

    assert_eq!(calls.voices(), expected);
}

#[tokio::test]
async fn test_default_style_is_first() {
    let (ci, calls) = coeiroink(2).await;
    ci.synthesize("テスト", &common::coeiroink_uuid(1), None).await.unwrap();
    assert_eq!(calls.voices(), vec![format!("{}/0", common::coeiroink_uuid(1))]);
}

#[tokio::test]
async fn test_style_of_another_speaker_is_rejected() {
    let (ci, calls) = coeiroink(2).await;
    let catalog = ci.fetch_speakers(false).await.unwrap();
    let foreign = catalog.get(&common::coeiroink_uuid(1)).unwrap().styles[1].id.clone();

    let err = ci
        .synthesize("テスト", &common::coeiroink_uuid(0), Some(&foreign))
        .await
        .unwrap_err();
    assert!(err.is_invalid_speaker());
    assert_eq!(Calls::count(&calls.synthesis), 0);
}

#[tokio::test]
async fn test_out_of_range_id_is_rejected() {
    let (ci, calls) = coeiroink(2).await;

    // index 9 does not exist in a two-speaker catalog
    let err = ci
        .synthesize("テスト", &common::coeiroink_uuid(0), Some("190"))
        .await
        .unwrap_err();
    match err {
        Error::InvalidSpeaker { backend, style, .. } => {
            assert_eq!(backend, "coeiroink");
            assert_eq!(style.as_deref(), Some("190"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(Calls::count(&calls.synthesis), 0);
}

#[tokio::test]
async fn test_ids_shift_when_catalog_grows() {
    let (small, _) = coeiroink(9).await;
    let (large, _) = coeiroink(10).await;

    let before = small.fetch_speakers(false).await.unwrap();
    let after = large.fetch_speakers(false).await.unwrap();

    let id_before = &before.get(&common::coeiroink_uuid(3)).unwrap().styles[0].id;
    let id_after = &after.get(&common::coeiroink_uuid(3)).unwrap().styles[0].id;
    assert_eq!(id_before, "130");
    assert_eq!(id_after, "1030");
}
