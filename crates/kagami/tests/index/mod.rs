use std::time::Duration;

use kagami::{HttpClient, SegmentIndex, SegmentIndexExtractor};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{fragmented_mp4, mock_media, mp4_box};

#[tokio::test]
async fn extract_segments_from_sidx() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let (data, _, index_range) =
        fragmented_mp4(90000, &[(1000, 180000), (2500, 450000), (800, 45000)]);
    mock_media(&server, "/video.mp4", data, index_range.end).await;

    let extractor = SegmentIndexExtractor::new(HttpClient::default());
    let url = format!("{}/video.mp4", server.uri()).parse()?;
    let segments = extractor.extract_segments(&url, index_range.end).await;

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].start, index_range.end);
    for pair in segments.windows(2) {
        assert_eq!(pair[0].start + pair[0].length, pair[1].start);
    }
    assert_eq!(segments[0].length, 1000);
    assert_eq!(segments[0].duration, 2.0);
    assert_eq!(segments[1].duration, 5.0);
    assert_eq!(segments[2].duration, 0.5);

    Ok(())
}

#[tokio::test]
async fn non_success_status_is_empty() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video.mp4"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let extractor = SegmentIndexExtractor::new(HttpClient::default());
    let url = format!("{}/video.mp4", server.uri()).parse()?;
    assert!(extractor.extract_segments(&url, 1000).await.is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_sidx_is_empty() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let mut data = mp4_box(b"ftyp", b"dash\0\0\0\0iso6mp41");
    data.extend(mp4_box(b"moov", &[0u8; 32]));
    let index_end = data.len() as u64 - 1;
    mock_media(&server, "/video.mp4", data, index_end).await;

    let extractor = SegmentIndexExtractor::new(HttpClient::default());
    let url = format!("{}/video.mp4", server.uri()).parse()?;
    assert!(extractor.extract_segments(&url, index_end).await.is_empty());

    Ok(())
}

#[tokio::test]
async fn slow_server_times_out() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let (data, _, index_range) = fragmented_mp4(1000, &[(100, 1000)]);
    Mock::given(method("GET"))
        .and(path("/video.mp4"))
        .respond_with(
            ResponseTemplate::new(206)
                .set_body_bytes(data)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let extractor = SegmentIndexExtractor::new(HttpClient::default())
        .with_timeout(Duration::from_millis(200));
    let url = format!("{}/video.mp4", server.uri()).parse()?;
    assert!(extractor
        .extract_segments(&url, index_range.end)
        .await
        .is_empty());

    Ok(())
}
