//! Integration tests for the key-exchange negotiation, driven over the in-memory transport.
//! 通过内存传输驱动的密钥交换协商集成测试。

use tls13_pq_kex::crypto::capabilities::Capabilities;
use tls13_pq_kex::crypto::suite::ProtocolVersion;
use tls13_pq_kex::error::{HandshakeError, ProtocolViolation, Result};
use tls13_pq_kex::handshake::client::{ClientFlight, HandshakeClient};
use tls13_pq_kex::handshake::server::{HandshakeServer, ServerFlight};
use tls13_pq_kex::policy::cipher::{CIPHER_PREFERENCES_20190801, CIPHER_PREFERENCES_TLS12_ONLY};
use tls13_pq_kex::policy::ecc::{
    ECC_CURVE_SECP256R1, ECC_CURVE_SECP521R1, ECC_CURVE_X25519, ECC_PREFERENCES_20200310, ECC_PREFERENCES_20201021,
    ECC_PREFERENCES_20240603, EccCurve, EccPreferences,
};
use tls13_pq_kex::policy::kem::{
    ALL_SUPPORTED_KEM_GROUPS, KEM_PREFERENCES_NULL, KemGroup, KemPreferences, SECP256R1_KYBER_512_R3,
    SECP256R1_KYBER_768_R3, SECP256R1_MLKEM_768, SECP384R1_KYBER_768_R3, SECP384R1_MLKEM_1024,
    SECP521R1_KYBER_1024_R3, X25519_KYBER_512_R3, X25519_KYBER_768_R3, X25519_MLKEM_768,
};
use tls13_pq_kex::policy::{
    SECURITY_POLICY_PQ_TLS_1_0_2020_12, SECURITY_POLICY_PQ_TLS_1_0_2021_05_22,
    SECURITY_POLICY_PQ_TLS_1_0_2021_05_23, SECURITY_POLICY_PQ_TLS_1_0_2021_05_24,
    SECURITY_POLICY_PQ_TLS_1_0_2021_05_26, SECURITY_POLICY_PQ_TLS_1_0_2023_01_24,
    SECURITY_POLICY_PQ_TLS_1_1_2021_05_21, SECURITY_POLICY_PQ_TLS_1_3_2023_06_01,
    SECURITY_POLICY_TEST_ALL_TLS13, SECURITY_POLICY_TEST_TLS13_RETRY, SecurityPolicy,
};
use tls13_pq_kex::protocol::key_share::KeyShareEntry;
use tls13_pq_kex::protocol::message::{
    HandshakeMessage, HelloRetryRequestPayload, ServerHelloPayload, hello_random,
};
use tls13_pq_kex::protocol::state::AwaitingHrrDecision;
use tls13_pq_kex::transport::{MemoryTransport, recv_message, send_message};

static KYBER_TEST_GROUPS: [&KemGroup; 6] = [
    &X25519_KYBER_512_R3,
    &SECP256R1_KYBER_512_R3,
    &SECP256R1_KYBER_768_R3,
    &SECP384R1_KYBER_768_R3,
    &SECP521R1_KYBER_1024_R3,
    &X25519_KYBER_768_R3,
];

static KEM_PREFERENCES_KYBER_TEST_DRAFT0: KemPreferences<'static> = KemPreferences {
    kems: &[],
    tls13_kem_groups: &KYBER_TEST_GROUPS,
    tls13_pq_hybrid_draft_revision: 0,
};

static KEM_PREFERENCES_KYBER_TEST_DRAFT5: KemPreferences<'static> = KemPreferences {
    kems: &[],
    tls13_kem_groups: &KYBER_TEST_GROUPS,
    tls13_pq_hybrid_draft_revision: 5,
};

static KYBER_TEST_DRAFT0_POLICY: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls13,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_KYBER_TEST_DRAFT0,
    ecc_preferences: &ECC_PREFERENCES_20200310,
    eager_ecc_share: true,
};

static KYBER_TEST_DRAFT5_POLICY: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls13,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_KYBER_TEST_DRAFT5,
    ecc_preferences: &ECC_PREFERENCES_20200310,
    eager_ecc_share: true,
};

static KYBER1024_TEST_GROUPS: [&KemGroup; 2] = [&SECP521R1_KYBER_1024_R3, &SECP256R1_KYBER_512_R3];
static KYBER768_TEST_GROUPS: [&KemGroup; 2] = [&SECP384R1_KYBER_768_R3, &SECP256R1_KYBER_512_R3];
static MLKEM768_TEST_GROUPS: [&KemGroup; 2] = [&X25519_MLKEM_768, &SECP256R1_MLKEM_768];
static MLKEM1024_TEST_GROUPS: [&KemGroup; 1] = [&SECP384R1_MLKEM_1024];

/// Everything both peers agreed on after one handshake.
#[derive(Debug)]
struct Outcome {
    group: &'static str,
    hybrid: bool,
    hrr: bool,
    len_prefixed: bool,
    secret_len: usize,
}

/// Runs a complete negotiation over a memory transport and checks the properties
/// every successful handshake must have.
fn negotiate_with(
    client_policy: &SecurityPolicy<'_>,
    client_capabilities: Capabilities,
    server_policy: &SecurityPolicy<'_>,
    server_capabilities: Capabilities,
) -> Result<Outcome> {
    let (mut client_io, mut server_io) = MemoryTransport::pair();
    let client = HandshakeClient::builder()
        .policy(client_policy)
        .capabilities(client_capabilities)
        .build()?;
    let server = HandshakeServer::builder()
        .policy(server_policy)
        .capabilities(server_capabilities)
        .build()?;

    // C -> S: ClientHello
    let (client_hello, client) = client.start_handshake()?;
    send_message(&mut client_io, &client_hello)?;

    let (client, server) = match server.process_client_hello(recv_message(&mut server_io)?)? {
        ServerFlight::Hello(server_hello, server) => {
            // S -> C: ServerHello
            send_message(&mut server_io, &server_hello)?;
            match client.process_server_flight(recv_message(&mut client_io)?)? {
                ClientFlight::Negotiated(client) => (client, server),
                ClientFlight::Retry(..) => panic!("client retried after a ServerHello"),
            }
        }
        ServerFlight::HelloRetry(retry, server) => {
            // S -> C: HelloRetryRequest
            send_message(&mut server_io, &retry)?;
            let ClientFlight::Retry(retried_hello, client) =
                client.process_server_flight(recv_message(&mut client_io)?)?
            else {
                panic!("client ignored the HelloRetryRequest");
            };
            // C -> S: retried ClientHello
            send_message(&mut client_io, &retried_hello)?;
            let (server_hello, server) =
                server.process_retried_client_hello(recv_message(&mut server_io)?)?;
            // S -> C: ServerHello
            send_message(&mut server_io, &server_hello)?;
            let client = client.process_server_hello(recv_message(&mut client_io)?)?;
            (client, server)
        }
    };
    assert_eq!(client_io.pending(), 0);
    assert_eq!(server_io.pending(), 0);

    // Both sides settled on the same single group or curve.
    assert_eq!(client.negotiated(), server.negotiated());
    let group = client.key_exchange_group()?;
    assert_eq!(group, server.key_exchange_group()?);
    for (kem_group, curve) in [
        (client.kem_group_name()?, client.curve_name()?),
        (server.kem_group_name()?, server.curve_name()?),
    ] {
        assert!(kem_group.is_some() != curve.is_some());
    }
    let hybrid = client.kem_group_name()?.is_some();

    let hrr = client.hello_retry_requested();
    assert_eq!(hrr, server.hello_retry_requested());
    if hybrid {
        assert_eq!(client.len_prefixed(), server.len_prefixed());
    }

    // Identical, non-trivial handshake secrets sized by the suite's hash.
    let suite = client.cipher_suite()?;
    assert_eq!(suite.iana_id, server.cipher_suite()?.iana_id);
    let client_secrets = client.secrets()?;
    let server_secrets = server.secrets()?;
    assert!(client_secrets.matches(server_secrets));
    assert_eq!(client_secrets.len(), suite.hash.output_len());
    assert!(client_secrets.extract_secret.iter().any(|&byte| byte != 0));

    let outcome = Outcome {
        group,
        hybrid,
        hrr,
        len_prefixed: client.len_prefixed(),
        secret_len: client_secrets.len(),
    };
    println!("negotiated {outcome:?}");
    Ok(outcome)
}

fn negotiate(client_policy: &SecurityPolicy<'_>, server_policy: &SecurityPolicy<'_>) -> Result<Outcome> {
    negotiate_with(
        client_policy,
        Capabilities::detect(),
        server_policy,
        Capabilities::detect(),
    )
}

fn expect_err<T>(result: Result<T>) -> HandshakeError {
    match result {
        Ok(_) => panic!("expected the handshake step to fail"),
        Err(err) => err,
    }
}

/// A client that has sent its first ClientHello, and that hello.
fn started_client(
    policy: &'static SecurityPolicy<'static>,
) -> Result<(HandshakeMessage, HandshakeClient<'static, AwaitingHrrDecision>)> {
    HandshakeClient::builder().policy(policy).build()?.start_handshake()
}

#[test]
fn every_available_group_negotiates_with_itself() -> Result<()> {
    let capabilities = Capabilities::detect();
    for group in ALL_SUPPORTED_KEM_GROUPS {
        if !capabilities.is_kem_group_available(group) {
            continue;
        }
        let groups = [group];
        let kem_preferences = KemPreferences {
            kems: &[],
            tls13_kem_groups: &groups,
            tls13_pq_hybrid_draft_revision: 5,
        };
        let policy = SecurityPolicy {
            minimum_protocol_version: ProtocolVersion::Tls13,
            cipher_preferences: &CIPHER_PREFERENCES_20190801,
            kem_preferences: &kem_preferences,
            ecc_preferences: &ECC_PREFERENCES_20240603,
            eager_ecc_share: true,
        };

        let outcome = negotiate(&policy, &policy)?;
        assert_eq!(outcome.group, group.name);
        assert!(outcome.hybrid);
        assert!(!outcome.hrr);
        assert!(!outcome.len_prefixed);
    }
    Ok(())
}

#[test]
fn named_policy_vectors() -> Result<()> {
    // (client, server, group, hrr, len_prefixed)
    let vectors: [(&SecurityPolicy<'_>, &SecurityPolicy<'_>, &str, bool, bool); 12] = [
        (
            &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01,
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_24,
            X25519_KYBER_512_R3.name,
            true,
            false,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_1_2021_05_21,
            &SECURITY_POLICY_PQ_TLS_1_1_2021_05_21,
            X25519_KYBER_512_R3.name,
            false,
            true,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_22,
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_22,
            X25519_KYBER_512_R3.name,
            false,
            true,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_23,
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_23,
            X25519_KYBER_512_R3.name,
            false,
            true,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_24,
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_24,
            X25519_KYBER_512_R3.name,
            false,
            true,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_26,
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_26,
            X25519_KYBER_512_R3.name,
            false,
            true,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_0_2023_01_24,
            &SECURITY_POLICY_PQ_TLS_1_0_2023_01_24,
            X25519_KYBER_512_R3.name,
            false,
            false,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01,
            &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01,
            SECP256R1_KYBER_768_R3.name,
            false,
            false,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_1_2021_05_21,
            &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01,
            X25519_KYBER_512_R3.name,
            false,
            true,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_24,
            &SECURITY_POLICY_PQ_TLS_1_0_2023_01_24,
            X25519_KYBER_512_R3.name,
            false,
            true,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_0_2023_01_24,
            &SECURITY_POLICY_PQ_TLS_1_0_2021_05_24,
            X25519_KYBER_512_R3.name,
            false,
            false,
        ),
        (
            &SECURITY_POLICY_PQ_TLS_1_0_2020_12,
            &SECURITY_POLICY_PQ_TLS_1_0_2020_12,
            X25519_KYBER_512_R3.name,
            false,
            true,
        ),
    ];

    for (client_policy, server_policy, group, hrr, len_prefixed) in vectors {
        let outcome = negotiate(client_policy, server_policy)?;
        assert_eq!(outcome.group, group);
        assert!(outcome.hybrid);
        assert_eq!(outcome.hrr, hrr, "unexpected retry behaviour for {group}");
        assert_eq!(outcome.len_prefixed, len_prefixed);
    }
    Ok(())
}

#[test]
fn hrr_settles_on_server_choice_never_client_default() -> Result<()> {
    // The client leads with secp256r1_kyber-768-r3, which the server lacks.
    let outcome = negotiate(
        &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01,
        &SECURITY_POLICY_PQ_TLS_1_0_2021_05_24,
    )?;
    assert_ne!(outcome.group, SECP256R1_KYBER_768_R3.name);
    assert_eq!(outcome.group, X25519_KYBER_512_R3.name);
    assert!(outcome.hrr);
    Ok(())
}

#[test]
fn larger_parameter_sets_negotiate_in_both_directions() -> Result<()> {
    for (groups, expected) in [
        (&KYBER1024_TEST_GROUPS, &SECP521R1_KYBER_1024_R3),
        (&KYBER768_TEST_GROUPS, &SECP384R1_KYBER_768_R3),
    ] {
        let kem_preferences = KemPreferences {
            kems: &[],
            tls13_kem_groups: groups,
            tls13_pq_hybrid_draft_revision: 5,
        };
        let policy = SecurityPolicy {
            minimum_protocol_version: ProtocolVersion::Tls13,
            cipher_preferences: &CIPHER_PREFERENCES_20190801,
            kem_preferences: &kem_preferences,
            ecc_preferences: &ECC_PREFERENCES_20201021,
            eager_ecc_share: true,
        };

        // Its first choice is in the 2023-06 list, so no retry is needed.
        let outcome = negotiate(&policy, &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01)?;
        assert_eq!(outcome.group, expected.name);
        assert!(!outcome.hrr);

        // The 2023-06 client leads with a group this server lacks.
        let outcome = negotiate(&SECURITY_POLICY_PQ_TLS_1_3_2023_06_01, &policy)?;
        assert_eq!(outcome.group, expected.name);
        assert!(outcome.hrr);
    }
    Ok(())
}

#[test]
fn client_draft_revision_decides_share_encoding() -> Result<()> {
    for (client, server, len_prefixed) in [
        (&KYBER_TEST_DRAFT0_POLICY, &KYBER_TEST_DRAFT5_POLICY, true),
        (&KYBER_TEST_DRAFT5_POLICY, &KYBER_TEST_DRAFT0_POLICY, false),
        (&SECURITY_POLICY_PQ_TLS_1_0_2020_12, &KYBER_TEST_DRAFT0_POLICY, true),
        (&SECURITY_POLICY_PQ_TLS_1_0_2020_12, &KYBER_TEST_DRAFT5_POLICY, true),
    ] {
        let outcome = negotiate(client, server)?;
        assert_eq!(outcome.group, X25519_KYBER_512_R3.name);
        assert!(!outcome.hrr);
        assert_eq!(outcome.len_prefixed, len_prefixed);
    }
    Ok(())
}

#[test]
fn mlkem_groups_negotiate() -> Result<()> {
    for (groups, expected) in [
        (&MLKEM768_TEST_GROUPS[..], &X25519_MLKEM_768),
        (&MLKEM1024_TEST_GROUPS[..], &SECP384R1_MLKEM_1024),
    ] {
        let kem_preferences = KemPreferences {
            kems: &[],
            tls13_kem_groups: groups,
            tls13_pq_hybrid_draft_revision: 5,
        };
        let policy = SecurityPolicy {
            minimum_protocol_version: ProtocolVersion::Tls13,
            cipher_preferences: &CIPHER_PREFERENCES_20190801,
            kem_preferences: &kem_preferences,
            ecc_preferences: &ECC_PREFERENCES_20240603,
            eager_ecc_share: true,
        };
        let outcome = negotiate(&policy, &policy)?;
        assert_eq!(outcome.group, expected.name);
        assert!(!outcome.hrr);
    }
    Ok(())
}

#[test]
fn retry_follows_server_capabilities() -> Result<()> {
    let kem_preferences = KemPreferences {
        kems: &[],
        tls13_kem_groups: &MLKEM768_TEST_GROUPS,
        tls13_pq_hybrid_draft_revision: 5,
    };
    let policy = SecurityPolicy {
        minimum_protocol_version: ProtocolVersion::Tls13,
        cipher_preferences: &CIPHER_PREFERENCES_20190801,
        kem_preferences: &kem_preferences,
        ecc_preferences: &ECC_PREFERENCES_20240603,
        eager_ecc_share: true,
    };
    // The server cannot serve X25519MLKEM768, so the client's default share is refused.
    let server_capabilities = Capabilities {
        evp_apis: false,
        ..Capabilities::detect()
    };
    let outcome = negotiate_with(&policy, Capabilities::detect(), &policy, server_capabilities)?;
    assert_eq!(outcome.group, SECP256R1_MLKEM_768.name);
    assert!(outcome.hybrid);
    assert!(outcome.hrr);
    assert!(!outcome.len_prefixed);
    Ok(())
}

#[test]
fn retried_hybrid_share_keeps_draft0_encoding() -> Result<()> {
    static SECP256R1_KYBER_ONLY: [&KemGroup; 1] = [&SECP256R1_KYBER_512_R3];
    let kem_preferences = KemPreferences {
        kems: &[],
        tls13_kem_groups: &SECP256R1_KYBER_ONLY,
        tls13_pq_hybrid_draft_revision: 5,
    };
    let server = SecurityPolicy {
        minimum_protocol_version: ProtocolVersion::Tls13,
        cipher_preferences: &CIPHER_PREFERENCES_20190801,
        kem_preferences: &kem_preferences,
        ecc_preferences: &ECC_PREFERENCES_20200310,
        eager_ecc_share: true,
    };
    let outcome = negotiate(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24, &server)?;
    assert_eq!(outcome.group, SECP256R1_KYBER_512_R3.name);
    assert!(outcome.hrr);
    assert!(outcome.len_prefixed);
    Ok(())
}

#[test]
fn retry_to_curve_drops_hybrid_encoding() -> Result<()> {
    static SECP256R1_ONLY: [&EccCurve; 1] = [&ECC_CURVE_SECP256R1];
    let ecc_preferences = EccPreferences {
        ecc_curves: &SECP256R1_ONLY,
    };
    let server = SecurityPolicy {
        kem_preferences: &KEM_PREFERENCES_NULL,
        ecc_preferences: &ecc_preferences,
        ..SECURITY_POLICY_TEST_ALL_TLS13
    };
    // The client's first hello carried a length-prefixed hybrid share.
    let outcome = negotiate(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24, &server)?;
    assert_eq!(outcome.group, ECC_CURVE_SECP256R1.name);
    assert!(!outcome.hybrid);
    assert!(outcome.hrr);
    assert!(!outcome.len_prefixed);
    Ok(())
}

#[test]
fn classical_curve_vectors() -> Result<()> {
    let ecc_retry_policy = SecurityPolicy {
        eager_ecc_share: false,
        ..SECURITY_POLICY_PQ_TLS_1_0_2020_12
    };
    for (client, server, hrr) in [
        (&SECURITY_POLICY_PQ_TLS_1_0_2020_12, &SECURITY_POLICY_TEST_ALL_TLS13, false),
        (&ecc_retry_policy, &SECURITY_POLICY_TEST_ALL_TLS13, true),
        (&SECURITY_POLICY_TEST_ALL_TLS13, &SECURITY_POLICY_PQ_TLS_1_0_2020_12, false),
        (&SECURITY_POLICY_TEST_TLS13_RETRY, &SECURITY_POLICY_PQ_TLS_1_0_2020_12, true),
    ] {
        let outcome = negotiate(client, server)?;
        assert_eq!(outcome.group, ECC_CURVE_X25519.name);
        assert!(!outcome.hybrid);
        assert_eq!(outcome.hrr, hrr);
    }
    Ok(())
}

#[test]
fn backend_without_kem_falls_back_to_curves() -> Result<()> {
    let policy = &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01;
    let classical = Capabilities::classical_only();

    // Neither side can do hybrid; the client's eager secp256r1 share is accepted.
    let outcome = negotiate_with(policy, classical, policy, classical)?;
    assert_eq!(outcome.group, "secp256r1");
    assert!(!outcome.hybrid);
    assert!(!outcome.hrr);

    // Only the server lacks KEM support; the client's classical share still lands.
    let outcome = negotiate_with(policy, Capabilities::detect(), policy, classical)?;
    assert_eq!(outcome.group, "secp256r1");
    assert!(!outcome.hrr);

    // Without an eager classical share the curve costs a retry.
    let lazy = SecurityPolicy {
        eager_ecc_share: false,
        ..SECURITY_POLICY_PQ_TLS_1_3_2023_06_01
    };
    let outcome = negotiate_with(&lazy, classical, &lazy, classical)?;
    assert_eq!(outcome.group, "secp256r1");
    assert!(outcome.hrr);
    Ok(())
}

#[test]
fn secret_length_follows_cipher_suite() -> Result<()> {
    // The 2023-06 policy prefers TLS_AES_256_GCM_SHA384.
    let outcome = negotiate(
        &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01,
        &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01,
    )?;
    assert_eq!(outcome.secret_len, 48);

    let outcome = negotiate(
        &SECURITY_POLICY_PQ_TLS_1_0_2021_05_24,
        &SECURITY_POLICY_PQ_TLS_1_0_2021_05_24,
    )?;
    assert_eq!(outcome.secret_len, 32);
    Ok(())
}

#[test]
fn no_mutual_group_fails() -> Result<()> {
    static CLIENT_CURVES: [&EccCurve; 1] = [&ECC_CURVE_X25519];
    static SERVER_CURVES: [&EccCurve; 1] = [&ECC_CURVE_SECP521R1];
    let client_ecc = EccPreferences {
        ecc_curves: &CLIENT_CURVES,
    };
    let server_ecc = EccPreferences {
        ecc_curves: &SERVER_CURVES,
    };
    let client_policy = SecurityPolicy {
        ecc_preferences: &client_ecc,
        ..SECURITY_POLICY_TEST_ALL_TLS13
    };
    let server_policy = SecurityPolicy {
        ecc_preferences: &server_ecc,
        ..SECURITY_POLICY_TEST_ALL_TLS13
    };

    let err = expect_err(negotiate(&client_policy, &server_policy));
    assert!(matches!(err, HandshakeError::NoMutualGroup));
    Ok(())
}

#[test]
fn accessors_fail_before_negotiation_completes() -> Result<()> {
    let (_, client) = started_client(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24)?;
    assert!(matches!(
        client.key_exchange_group(),
        Err(HandshakeError::NegotiationIncomplete)
    ));
    assert!(matches!(
        client.kem_group_name(),
        Err(HandshakeError::NegotiationIncomplete)
    ));
    assert!(matches!(
        client.curve_name(),
        Err(HandshakeError::NegotiationIncomplete)
    ));
    Ok(())
}

#[test]
fn builders_reject_incomplete_configuration() {
    let err = expect_err(HandshakeClient::builder().build());
    assert!(matches!(err, HandshakeError::BuilderMissingField("policy")));

    let legacy = SecurityPolicy {
        cipher_preferences: &CIPHER_PREFERENCES_TLS12_ONLY,
        ..SECURITY_POLICY_TEST_ALL_TLS13
    };
    let err = expect_err(HandshakeServer::builder().policy(&legacy).build());
    assert!(matches!(err, HandshakeError::Safety(_)));
    let err = expect_err(HandshakeClient::builder().policy(&legacy).build());
    assert!(matches!(err, HandshakeError::Safety(_)));
}

#[test]
fn retried_hello_must_answer_the_request() -> Result<()> {
    let (client_hello, _client) = started_client(&SECURITY_POLICY_PQ_TLS_1_3_2023_06_01)?;
    let server = HandshakeServer::builder()
        .policy(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24)
        .build()?;
    let ServerFlight::HelloRetry(_, server) = server.process_client_hello(client_hello)? else {
        panic!("server accepted a group it does not support");
    };

    // A fresh ClientHello that simply repeats the first offer.
    let (unrelated_hello, _) = started_client(&SECURITY_POLICY_PQ_TLS_1_3_2023_06_01)?;
    let err = expect_err(server.process_retried_client_hello(unrelated_hello));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::RetryMismatch {
            requested: 0x2F39
        })
    ));
    Ok(())
}

#[test]
fn client_rejects_bad_retry_requests() -> Result<()> {
    let retry = |group: u16| {
        HandshakeMessage::HelloRetryRequest(HelloRetryRequestPayload {
            cipher_suite: 0x1301,
            selected_group: group,
        })
    };

    // X25519MLKEM768 is not in the 2021-05 list.
    let (_, client) = started_client(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24)?;
    let err = expect_err(client.process_server_flight(retry(X25519_MLKEM_768.iana_id)));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::UnsupportedRetryGroup(0x11EC))
    ));

    // The client already sent an x25519_kyber-512-r3 share.
    let (_, client) = started_client(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24)?;
    let err = expect_err(client.process_server_flight(retry(X25519_KYBER_512_R3.iana_id)));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::RedundantRetry(0x2F39))
    ));

    // A suite the client never offered.
    let (_, client) = started_client(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24)?;
    let foreign_suite = HandshakeMessage::HelloRetryRequest(HelloRetryRequestPayload {
        cipher_suite: 0x1304,
        selected_group: SECP256R1_KYBER_512_R3.iana_id,
    });
    let err = expect_err(client.process_server_flight(foreign_suite));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::CipherSuiteMismatch(0x1304))
    ));
    Ok(())
}

#[test]
fn client_rejects_second_retry_and_mismatched_server_hello() -> Result<()> {
    let first_retry = HandshakeMessage::HelloRetryRequest(HelloRetryRequestPayload {
        cipher_suite: 0x1301,
        selected_group: SECP256R1_KYBER_512_R3.iana_id,
    });

    let (_, client) = started_client(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24)?;
    let ClientFlight::Retry(retried, client) = client.process_server_flight(first_retry.clone())?
    else {
        panic!("client did not retry");
    };
    let HandshakeMessage::ClientHello(retried) = retried else {
        panic!("retry is not a ClientHello");
    };
    assert_eq!(retried.key_shares.len(), 1);
    assert_eq!(retried.key_shares[0].group, SECP256R1_KYBER_512_R3.iana_id);

    let err = expect_err(client.process_server_hello(first_retry.clone()));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::SecondRetry)
    ));

    let (_, client) = started_client(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24)?;
    let ClientFlight::Retry(_, client) = client.process_server_flight(first_retry)? else {
        panic!("client did not retry");
    };
    let wrong_group = HandshakeMessage::ServerHello(ServerHelloPayload {
        random: hello_random(),
        cipher_suite: 0x1301,
        key_share: KeyShareEntry::new(ECC_CURVE_X25519.iana_id, vec![9; 32]),
    });
    let err = expect_err(client.process_server_hello(wrong_group));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::RetryMismatch {
            requested: 0x2F3A
        })
    ));
    Ok(())
}

#[test]
fn server_rejects_malformed_client_hellos() -> Result<()> {
    let server = || {
        HandshakeServer::builder()
            .policy(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24)
            .build()
    };
    let tampered = |edit: fn(&mut Vec<KeyShareEntry>)| -> Result<HandshakeMessage> {
        let (hello, _) = started_client(&SECURITY_POLICY_PQ_TLS_1_0_2021_05_24)?;
        let HandshakeMessage::ClientHello(mut hello) = hello else {
            panic!("client did not start with a ClientHello");
        };
        edit(&mut hello.key_shares);
        Ok(HandshakeMessage::ClientHello(hello))
    };

    let truncated = tampered(|shares| {
        shares[0].key_exchange.pop();
    })?;
    let err = expect_err(server()?.process_client_hello(truncated));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::MalformedKeyShare { group: 0x2F39 })
    ));

    let duplicated = tampered(|shares| {
        let first = shares[0].clone();
        shares.push(first);
    })?;
    let err = expect_err(server()?.process_client_hello(duplicated));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::DuplicateKeyShare(0x2F39))
    ));

    let unlisted = tampered(|shares| {
        shares.push(KeyShareEntry::new(ECC_CURVE_SECP521R1.iana_id, vec![4; 133]));
    })?;
    let err = expect_err(server()?.process_client_hello(unlisted));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::UnofferedGroup(25))
    ));

    let out_of_order = HandshakeMessage::HelloRetryRequest(HelloRetryRequestPayload {
        cipher_suite: 0x1301,
        selected_group: 29,
    });
    let err = expect_err(server()?.process_client_hello(out_of_order));
    assert!(matches!(
        err,
        HandshakeError::Protocol(ProtocolViolation::UnexpectedMessage {
            expected: "ClientHello",
            ..
        })
    ));
    Ok(())
}
