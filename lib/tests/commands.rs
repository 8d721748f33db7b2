//! Command-level tests against a scripted device

mod helpers;
use helpers::*;

use ledger_mvx::{
    apdu::{status::DeviceError, MVX_APDU_CLA},
    DeviceHandle, Error,
};

#[tokio::test]
async fn app_version() {
    let d = MockDevice::new([ok(b"1.0.22")]);
    let h = DeviceHandle::from(d.clone());

    let v = h.app_version().await.unwrap();
    assert_eq!(v, "1.0.22");

    // Cached in session state
    assert_eq!(h.session().await.app_version, "1.0.22");

    let log = d.log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0.cla, MVX_APDU_CLA);
    assert_eq!(log[0].0.ins, 0x01);
    assert!(log[0].1.is_empty());
}

#[tokio::test]
async fn app_configuration() {
    let d = MockDevice::new([ok(&[1, 0, 0, 1, 0, 22])]);
    let h = DeviceHandle::from(d.clone());

    let c = h.app_configuration().await.unwrap();
    assert!(c.contract_data);
    assert_eq!((c.major, c.minor, c.patch), (1, 0, 22));

    let s = h.session().await;
    assert!(s.contract_data);
    assert_eq!(s.firmware_version, "1.0.22");
    assert_eq!(d.log()[0].0.ins, 0x02);
}

#[tokio::test]
async fn app_configuration_rejects_wrong_length() {
    let d = MockDevice::new([ok(&[1, 0, 0, 1, 0])]);
    let h = DeviceHandle::from(d);

    match h.app_configuration().await {
        Err(Error::InvalidConfigResponse) => (),
        r => panic!("unexpected result: {:?}", r),
    }
}

#[tokio::test]
async fn get_address() {
    let mut payload = vec![32u8];
    payload.extend_from_slice(&[0xcd; 32]);

    let d = MockDevice::new([ok(&payload)]);
    let h = DeviceHandle::from(d.clone());

    let addr = h.get_address(0, 0, true).await.unwrap();
    assert_eq!(addr, vec![0xcd; 32]);

    let log = d.log();
    assert_eq!(log[0].0.ins, 0x03);
    assert_eq!(log[0].0.p1, 0x01);
    assert_eq!(log[0].0.p2, 0x00);
    assert_eq!(log[0].1, vec![0, 0, 0, 0, 0, 0, 0, 0]);
}

#[tokio::test]
async fn get_address_without_confirmation_is_silent() {
    let mut payload = vec![32u8];
    payload.extend_from_slice(&[0xcd; 32]);

    let d = MockDevice::new([ok(&payload)]);
    let h = DeviceHandle::from(d.clone());

    h.get_address_without_confirmation(1, 2).await.unwrap();

    let log = d.log();
    assert_eq!(log[0].0.p1, 0x00);
    assert_eq!(log[0].1, vec![0, 0, 0, 1, 0, 0, 0, 2]);
}

#[tokio::test]
async fn get_address_rejects_length_mismatch() {
    // Length byte claims one byte fewer than the device sent
    let mut payload = vec![31u8];
    payload.extend_from_slice(&[0xcd; 32]);

    let d = MockDevice::new([ok(&payload)]);
    let h = DeviceHandle::from(d);

    match h.get_address(0, 0, true).await {
        Err(Error::InvalidAddressResponse) => (),
        r => panic!("unexpected result: {:?}", r),
    }
}

#[tokio::test]
async fn set_address_pins_session_state() {
    let d = MockDevice::new([ok(&[])]);
    let h = DeviceHandle::from(d.clone());

    h.set_address(3, 7).await.unwrap();

    let s = h.session().await;
    assert_eq!(s.account, 3);
    assert_eq!(s.address_index, 7);

    let log = d.log();
    assert_eq!(log[0].0.ins, 0x05);
    assert_eq!(log[0].1, vec![0, 0, 0, 3, 0, 0, 0, 7]);
}

#[tokio::test]
async fn set_address_failure_leaves_session_untouched() {
    let d = MockDevice::new([status(0x6e13)]);
    let h = DeviceHandle::from(d);

    match h.set_address(3, 7).await {
        Err(Error::Device(DeviceError::IndexOutOfBounds)) => (),
        r => panic!("unexpected result: {:?}", r),
    }

    let s = h.session().await;
    assert_eq!(s.account, 0);
    assert_eq!(s.address_index, 0);
}

#[tokio::test]
async fn short_response_is_missing_status_word() {
    for resp in [vec![], vec![0x90u8]] {
        let d = MockDevice::new([resp]);
        let h = DeviceHandle::from(d);

        match h.app_version().await {
            Err(Error::MissingStatusWord) => (),
            r => panic!("unexpected result: {:?}", r),
        }
    }
}

#[tokio::test]
async fn status_words_map_to_device_errors() {
    let cases = [
        (0x6985u16, DeviceError::UserDenied),
        (0x6d00, DeviceError::UnknownInstruction),
        (0x6e00, DeviceError::WrongCla),
        (0x6e07, DeviceError::ContractDataDisabled),
        (0x6e0e, DeviceError::DataTooLong),
        (0x6f42, DeviceError::Unknown(0x6f42)),
    ];

    for (sw, expected) in cases {
        let d = MockDevice::new([status(sw)]);
        let h = DeviceHandle::from(d);

        match h.app_version().await {
            Err(Error::Device(e)) if e == expected => (),
            r => panic!("status 0x{:04x}: unexpected result: {:?}", sw, r),
        }
    }
}

#[tokio::test]
async fn user_rejection_is_a_cancellation() {
    let d = MockDevice::new([status(0x6985)]);
    let h = DeviceHandle::from(d);

    let e = h.get_address(0, 0, true).await.unwrap_err();
    assert!(e.is_user_denied());
}
