//! Multi-chunk signing tests against a scripted device

mod helpers;
use helpers::*;

use ledger_mvx::{
    apdu::{esdt::EsdtInfo, status::DeviceError},
    DeviceHandle, Error,
};

#[tokio::test]
async fn sign_transaction_chunks_large_payloads() {
    let sig = [0xabu8; 64];
    let d = MockDevice::new([ok(&[]), ok(&[]), ok(&sig_payload(&sig))]);
    let h = DeviceHandle::from(d.clone());

    // 600 bytes split 255 + 255 + 90
    let tx = vec![0x42u8; 600];
    let got = h.sign_transaction(&tx).await.unwrap();
    assert_eq!(got, sig);

    let log = d.log();
    assert_eq!(log.len(), 3);

    for (hdr, _) in &log {
        assert_eq!(hdr.ins, 0x04);
    }

    assert_eq!(log[0].0.p1, 0x00);
    assert_eq!(log[1].0.p1, 0x80);
    assert_eq!(log[2].0.p1, 0x80);

    assert_eq!(log[0].1.len(), 255);
    assert_eq!(log[1].1.len(), 255);
    assert_eq!(log[2].1.len(), 90);
}

#[tokio::test]
async fn sign_transaction_single_chunk() {
    let sig = [0x01u8; 64];
    let d = MockDevice::new([ok(&sig_payload(&sig))]);
    let h = DeviceHandle::from(d.clone());

    let tx = vec![0x42u8; 255];
    h.sign_transaction(&tx).await.unwrap();

    let log = d.log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0.p1, 0x00);
    assert_eq!(log[0].1.len(), 255);
}

#[tokio::test]
async fn rejection_mid_sequence_stops_the_chunk_stream() {
    // Only two responses scripted; the mock panics on a third exchange,
    // so success here proves chunk three was never sent
    let d = MockDevice::new([ok(&[]), status(0x6985)]);
    let h = DeviceHandle::from(d.clone());

    let tx = vec![0x42u8; 600];
    match h.sign_transaction(&tx).await {
        Err(Error::Device(DeviceError::UserDenied)) => (),
        r => panic!("unexpected result: {:?}", r),
    }

    assert_eq!(d.log().len(), 2);
    assert_eq!(d.remaining(), 0);
}

#[tokio::test]
async fn sign_message_prefixes_text_length() {
    let sig = [0x5au8; 64];
    let d = MockDevice::new([ok(&sig_payload(&sig))]);
    let h = DeviceHandle::from(d.clone());

    let got = h.sign_message("abcd").await.unwrap();
    assert_eq!(got, sig);

    let log = d.log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0.ins, 0x06);
    assert_eq!(log[0].1, b"\x00\x00\x00\x04abcd".to_vec());
}

#[tokio::test]
async fn sign_transaction_hash_uses_hash_instruction() {
    let sig = [0x77u8; 64];
    let d = MockDevice::new([ok(&sig_payload(&sig))]);
    let h = DeviceHandle::from(d.clone());

    h.sign_transaction_hash(&[1, 2, 3]).await.unwrap();

    assert_eq!(d.log()[0].0.ins, 0x07);
}

#[tokio::test]
async fn malformed_signature_responses_are_rejected() {
    // Wrong total length, wrong leading length byte, empty final payload
    let mut wrong_len = vec![64u8];
    wrong_len.extend_from_slice(&[0u8; 63]);

    let mut wrong_tag = vec![63u8];
    wrong_tag.extend_from_slice(&[0u8; 64]);

    for final_payload in [wrong_len, wrong_tag, vec![]] {
        let d = MockDevice::new([ok(&final_payload)]);
        let h = DeviceHandle::from(d);

        match h.sign_transaction(&[0u8; 16]).await {
            Err(Error::InvalidSignature) => (),
            r => panic!("unexpected result: {:?}", r),
        }
    }
}

#[tokio::test]
async fn sign_auth_token_returns_address_and_signature() {
    let address = b"erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";
    let sig = [0x33u8; 64];

    let mut payload = vec![(address.len() + 64) as u8];
    payload.extend_from_slice(address);
    payload.extend_from_slice(&sig);

    let d = MockDevice::new([ok(&payload)]);
    let h = DeviceHandle::from(d.clone());

    let (addr, got) = h.sign_auth_token(0, 1, b"token").await.unwrap();
    assert_eq!(addr.as_bytes(), address);
    assert_eq!(got, sig);

    let log = d.log();
    assert_eq!(log[0].0.ins, 0x09);
    // account ‖ index ‖ token length ‖ token
    assert_eq!(log[0].1, b"\x00\x00\x00\x00\x00\x00\x00\x01\x00\x00\x00\x05token".to_vec());
}

#[tokio::test]
async fn sign_auth_token_rejects_short_response() {
    let d = MockDevice::new([ok(&[5, 1, 2, 3, 4, 5])]);
    let h = DeviceHandle::from(d);

    match h.sign_auth_token(0, 0, b"token").await {
        Err(Error::InvalidAuthTokenResponse) => (),
        r => panic!("unexpected result: {:?}", r),
    }
}

#[tokio::test]
async fn provide_esdt_info_is_a_single_exchange() {
    let d = MockDevice::new([ok(&[])]);
    let h = DeviceHandle::from(d.clone());

    let info = EsdtInfo {
        ticker: "USDC",
        identifier: "USDC-c76f1f",
        decimals: 6,
        chain_id: "1",
        signature: &[0xaa; 70],
    };
    h.provide_esdt_info(&info).await.unwrap();

    let log = d.log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0.ins, 0x08);
    assert_eq!(log[0].1[0], 4);
    assert_eq!(&log[0].1[1..5], b"USDC");
}
