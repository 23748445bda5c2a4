use rand::{SeedableRng, rngs::StdRng};
use sporadio::{
    Error,
    radio::{MAX_SEEDS, reseed, seed::pick_seeds, seed::sample_page_index},
    spotify::client::provider_error,
    utils::*,
};

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    // Should be exactly 128 characters
    assert_eq!(verifier.len(), 128);

    // Should contain only alphanumeric characters
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated verifiers should be different
    let verifier2 = generate_code_verifier();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_challenge() {
    let verifier = "test_verifier_123";
    let challenge = generate_code_challenge(verifier);

    // Should not be empty
    assert!(!challenge.is_empty());

    // Should be deterministic - same input produces same output
    let challenge2 = generate_code_challenge(verifier);
    assert_eq!(challenge, challenge2);

    // Different input should produce different output
    let challenge3 = generate_code_challenge("different_verifier");
    assert_ne!(challenge, challenge3);

    // URL safe base64 without padding
    assert!(!challenge.contains('='));
    assert!(!challenge.contains('+'));
    assert!(!challenge.contains('/'));
}

#[test]
fn test_code_challenge_known_vector() {
    // RFC 7636, appendix B
    let challenge = generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
    assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
}

#[test]
fn test_track_id_from_url() {
    assert_eq!(
        track_id_from_url("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc"),
        Some("4uLU6hMCjMI75M1A2tKUQC".to_string())
    );
    assert_eq!(
        track_id_from_url("https://open.spotify.com/intl-de/track/4uLU6hMCjMI75M1A2tKUQC"),
        Some("4uLU6hMCjMI75M1A2tKUQC".to_string())
    );
    assert_eq!(
        track_id_from_url("https://open.spotify.com/album/1ATL5GLyefJaxhQzSPVrLX"),
        None
    );
    assert_eq!(track_id_from_url("not a url"), None);
}

#[test]
fn test_id_from_uri() {
    assert_eq!(id_from_uri("spotify:playlist:37i9dQZF1"), Some("37i9dQZF1"));
    assert_eq!(id_from_uri("spotify:album:abc"), Some("abc"));
    assert_eq!(id_from_uri("spotify:album:"), None);
    assert_eq!(id_from_uri("https://open.spotify.com"), None);
}

#[test]
fn test_track_uri() {
    assert_eq!(track_uri("abc"), "spotify:track:abc");
}

#[test]
fn test_provider_error_detects_no_active_device() {
    let body = r#"{"error":{"status":404,"message":"Player command failed: No active device found","reason":"NO_ACTIVE_DEVICE"}}"#;
    assert!(provider_error(404, body).is_no_active_device());

    let body = r#"{"error":{"status":404,"message":"No active device found"}}"#;
    assert!(matches!(provider_error(404, body), Error::NoActiveDevice));
}

#[test]
fn test_provider_error_keeps_other_failures() {
    let body = r#"{"error":{"status":403,"message":"Player command failed: Restriction violated"}}"#;
    match provider_error(403, body) {
        Error::Provider { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Player command failed: Restriction violated");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    match provider_error(500, "upstream exploded") {
        Error::Provider { message, .. } => assert_eq!(message, "upstream exploded"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_sample_page_index_never_picks_last_page() {
    let mut rng = StdRng::seed_from_u64(3);

    // a single (possibly short) page is always page 0
    for total in [1, 10, 50] {
        assert_eq!(sample_page_index(&mut rng, total), 0);
    }

    // 120 items: pages 0, 1 and a short page 2
    for _ in 0..200 {
        assert!(sample_page_index(&mut rng, 120) < 2);
    }

    // 100 items: two full pages, only the first is sampled
    for _ in 0..50 {
        assert_eq!(sample_page_index(&mut rng, 100), 0);
    }
}

#[test]
fn test_pick_seeds_dedupes_and_caps() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut ids: Vec<String> = (0..20).map(|i| format!("t{i}")).collect();
    ids.push("t0".to_string());

    let seeds = pick_seeds(&mut rng, ids.clone());

    assert_eq!(seeds.len(), MAX_SEEDS);
    let mut unique = seeds.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), seeds.len());
    assert!(seeds.iter().all(|s| ids.contains(s)));

    let few = pick_seeds(&mut rng, vec!["a".to_string(), "a".to_string(), "b".to_string()]);
    assert_eq!(few.len(), 2);
}

#[test]
fn test_reseed_skips_edges() {
    let mut rng = StdRng::seed_from_u64(5);
    let candidates: Vec<String> = (0..10).map(|i| format!("c{i}")).collect();

    for _ in 0..100 {
        let seed = reseed(&mut rng, &candidates).unwrap();
        assert_eq!(seed.tracks.len(), 1);
        assert_ne!(seed.tracks[0], "c0");
        assert_ne!(seed.tracks[0], "c9");
    }

    assert!(reseed(&mut rng, &[]).is_none());
    let single = reseed(&mut rng, &["only".to_string()]).unwrap();
    assert_eq!(single.tracks, vec!["only".to_string()]);
}
