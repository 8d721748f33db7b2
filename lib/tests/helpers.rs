#![allow(dead_code)]

//! Shared test helpers: a scripted in-process device at the [Exchange] seam

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use ledger_mvx::{
    apdu::{ApduHeader, ApduReq, Encode},
    transport::Exchange,
    Error,
};

#[derive(Default)]
pub struct MockState {
    /// Raw responses (payload + status word) served in order
    pub responses: VecDeque<Vec<u8>>,
    /// Requests received, header plus encoded data field
    pub log: Vec<(ApduHeader, Vec<u8>)>,
}

/// Scripted device: replays queued responses and records every request.
///
/// Panics on an exchange past the end of the script, so a test scripting
/// two responses also proves no third request was ever sent.
#[derive(Clone, Default)]
pub struct MockDevice {
    pub state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    pub fn new(responses: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                responses: responses.into_iter().collect(),
                log: vec![],
            })),
        }
    }

    pub fn log(&self) -> Vec<(ApduHeader, Vec<u8>)> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().unwrap().responses.len()
    }
}

#[async_trait]
impl Exchange for MockDevice {
    type Error = Error;

    async fn exchange(&mut self, req: &(dyn ApduReq + Sync)) -> Result<Vec<u8>, Error> {
        let mut s = self.state.lock().unwrap();

        let n = req.encode_len().map_err(Error::Apdu)?;
        let mut data = vec![0u8; n];
        req.encode(&mut data).map_err(Error::Apdu)?;

        s.log.push((req.header(), data));

        Ok(s.responses.pop_front().expect("unscripted exchange"))
    }
}

/// Successful response: payload followed by status word 0x9000
pub fn ok(payload: &[u8]) -> Vec<u8> {
    let mut v = payload.to_vec();
    v.extend_from_slice(&0x9000u16.to_be_bytes());
    v
}

/// Bare status word response
pub fn status(sw: u16) -> Vec<u8> {
    sw.to_be_bytes().to_vec()
}

/// Well-formed final signing response payload for `sig`
pub fn sig_payload(sig: &[u8; 64]) -> Vec<u8> {
    let mut v = vec![64u8];
    v.extend_from_slice(sig);
    v
}
