use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

use hourglass_core::constants::{IV_LEN, SALT_LEN, SECRET_LEN};
use hourglass_core::error::ProtocolError;
use hourglass_core::record::{Reveal, TimeLockRecord};
use hourglass_core::types::{ChainParams, Digest, RecordId, Status, Tick, Window};
use hourglass_crypto::chain::ChainState;
use hourglass_crypto::{derive_final_key, record_id, wrap_secret};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::db::StateDb;

// ── Epoch ─────────────────────────────────────────────────────────────────────

/// In-memory half of one chain lifetime (between two resets).
struct Epoch {
    clock: Clock,
    /// Single writer lock around chain extension; readers take it too so a
    /// checksum never observes a half-built tail.
    chain: Mutex<ChainState>,
}

impl Epoch {
    fn new(params: ChainParams, tick: Tick) -> Self {
        Self {
            clock: Clock::starting_at(tick),
            chain: Mutex::new(ChainState::rebuilt(params, tick)),
        }
    }

    fn checksum(&self, window: &Window) -> Result<Digest, ProtocolError> {
        let mut chain = self.chain.lock().map_err(|_| poisoned())?;
        chain.extend_to(window.end);
        Ok(chain.checksum(window)?)
    }
}

fn poisoned() -> ProtocolError {
    ProtocolError::InternalChainError("engine lock poisoned".into())
}

fn fresh_params() -> ChainParams {
    let mut seed = [0u8; 32];
    let mut salt = vec![0u8; SALT_LEN];
    OsRng.fill_bytes(&mut seed);
    OsRng.fill_bytes(&mut salt);
    ChainParams {
        seed: Digest::from_bytes(seed),
        salt,
    }
}

// ── EncryptReceipt ────────────────────────────────────────────────────────────

/// What Encrypt hands back: the wrapped payload plus everything a client
/// needs to recompute `k_public` on its own.
#[derive(Debug, Clone)]
pub struct EncryptReceipt {
    pub record_id: RecordId,
    pub window: Window,
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub params: ChainParams,
}

// ── ProtocolEngine ────────────────────────────────────────────────────────────

/// Encrypt / Verify / Reset over the chain, the clock and the record store.
///
/// Every operation holds the epoch read guard for its whole duration; Reset
/// takes the write guard, so it never interleaves with a request or a tick.
pub struct ProtocolEngine {
    pub db: Arc<StateDb>,
    config: EngineConfig,
    epoch: RwLock<Epoch>,
}

impl ProtocolEngine {
    /// Load chain parameters and tick from `db`, seeding a new chain if the
    /// database is fresh.
    pub fn open(db: Arc<StateDb>, config: EngineConfig) -> Result<Self, ProtocolError> {
        let params = match db.get_chain_params()? {
            Some(p) => p,
            None => {
                let p = fresh_params();
                db.put_chain_params(&p)?;
                db.put_tick(0)?;
                info!(seed = %p.seed, "fresh database, seeded new chain");
                p
            }
        };
        let tick = db.get_tick()?.unwrap_or(0);
        info!(tick, records = db.record_count(), "protocol engine opened");

        Ok(Self {
            db,
            config,
            epoch: RwLock::new(Epoch::new(params, tick)),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn epoch(&self) -> Result<RwLockReadGuard<'_, Epoch>, ProtocolError> {
        self.epoch.read().map_err(|_| poisoned())
    }

    /// `(current_tick, chain_length)`. Read-only.
    pub fn status(&self) -> Result<Status, ProtocolError> {
        let epoch = self.epoch()?;
        let chain = epoch.chain.lock().map_err(|_| poisoned())?;
        Ok(Status {
            current_tick: epoch.clock.now(),
            chain_length: chain.len(),
        })
    }

    /// Published `seed`/`salt` of the current chain.
    pub fn chain_params(&self) -> Result<ChainParams, ProtocolError> {
        let epoch = self.epoch()?;
        let chain = epoch.chain.lock().map_err(|_| poisoned())?;
        Ok(chain.params().clone())
    }

    /// One clock tick: extend the chain to the next index, persist, then
    /// publish the new tick.
    pub fn advance_clock(&self) -> Result<Tick, ProtocolError> {
        let epoch = self.epoch()?;
        let mut chain = epoch.chain.lock().map_err(|_| poisoned())?;
        let next = epoch.clock.now() + 1;
        chain.extend_to(next);
        self.db.put_tick(next)?;
        Ok(epoch.clock.advance())
    }

    // ── Encrypt ───────────────────────────────────────────────────────────────

    /// Time-lock `payload` until the clock reaches `window.end`.
    pub fn encrypt(
        &self,
        payload: &[u8],
        window: Window,
        request_nonce: &str,
    ) -> Result<EncryptReceipt, ProtocolError> {
        let epoch = self.epoch()?;
        let now = epoch.clock.now();

        // ── Window validation ─────────────────────────────────────────────────
        if !window.is_ordered() {
            return Err(ProtocolError::InvalidWindow(format!(
                "t_start {} must be before t_end {}",
                window.start, window.end
            )));
        }
        if window.end < now {
            return Err(ProtocolError::InvalidWindow(format!(
                "t_end {} has already passed (current tick {now})",
                window.end
            )));
        }
        let limit = now.saturating_add(self.config.max_horizon);
        if window.end > limit {
            return Err(ProtocolError::InvalidWindow(format!(
                "t_end {} is beyond the horizon (max {limit})",
                window.end
            )));
        }

        // ── Replay check ──────────────────────────────────────────────────────
        if !self.db.admit_nonce(request_nonce)? {
            debug!(%window, "encrypt rejected: replayed nonce");
            return Err(ProtocolError::ReplayedNonce);
        }

        // ── Derive and wrap ───────────────────────────────────────────────────
        // The chain is computed ahead of the clock when needed; only the
        // release of k_private is gated on the tick.
        let k_public = epoch.checksum(&window)?;

        let mut k_private = Zeroizing::new([0u8; SECRET_LEN]);
        OsRng.fill_bytes(&mut k_private[..]);
        let k_final = derive_final_key(&k_public, &k_private)?;
        let wrapped = wrap_secret(&k_final, payload)?;

        let mut entropy = [0u8; 16];
        OsRng.fill_bytes(&mut entropy);
        let id = record_id(&window, now, &entropy);

        let record = TimeLockRecord {
            id: id.clone(),
            window,
            k_private: *k_private,
            ciphertext: wrapped.ciphertext.clone(),
            iv: wrapped.iv,
            burned: false,
            created_tick: now,
            created_at: chrono::Utc::now().timestamp(),
        };

        // ── Commit ────────────────────────────────────────────────────────────
        // Record and window binding land together or not at all.
        if !self.db.insert_record(&record)? {
            debug!(%window, "encrypt rejected: window already has a record");
            return Err(ProtocolError::DuplicateWindow(window));
        }

        info!(record_id = %id, %window, tick = now, "record sealed");
        let params = epoch.chain.lock().map_err(|_| poisoned())?.params().clone();
        Ok(EncryptReceipt {
            record_id: id,
            window,
            ciphertext: wrapped.ciphertext,
            iv: wrapped.iv,
            params,
        })
    }

    // ── Verify ────────────────────────────────────────────────────────────────

    /// Release `k_private` for `window` if the clock has reached `window.end`
    /// and `checksum_claim` equals the server's own window checksum.
    ///
    /// Checks run in a fixed order and the first failure wins; nothing but
    /// the nonce ledger is touched before the burn.
    pub fn verify(
        &self,
        checksum_claim: &[u8],
        window: Window,
        request_nonce: &str,
        expected_record: Option<&RecordId>,
    ) -> Result<Reveal, ProtocolError> {
        let epoch = self.epoch()?;

        // 1. Replay.
        if !self.db.admit_nonce(request_nonce)? {
            debug!(%window, "verify rejected: replayed nonce");
            return Err(ProtocolError::ReplayedNonce);
        }

        // 2. Record exists and is live.
        let id = self
            .db
            .record_for_window(&window)?
            .ok_or(ProtocolError::UnknownOrBurnedRecord(window))?;
        if expected_record.is_some_and(|expected| *expected != id) {
            return Err(ProtocolError::UnknownOrBurnedRecord(window));
        }
        let record = self
            .db
            .get_record(&id)?
            .ok_or(ProtocolError::UnknownOrBurnedRecord(window))?;
        if record.burned {
            return Err(ProtocolError::UnknownOrBurnedRecord(window));
        }

        // 3. Gate on the clock.
        let now = epoch.clock.now();
        if now < window.end {
            return Err(ProtocolError::TimeLockNotReached {
                current: now,
                unlock_at: window.end,
            });
        }

        // 4. Recompute the commitment; never trust the claim.
        let k_public = epoch.checksum(&window)?;
        if !bool::from(checksum_claim.ct_eq(k_public.as_bytes())) {
            warn!(record_id = %id, %window, "verify rejected: checksum mismatch");
            return Err(ProtocolError::ChecksumMismatch);
        }

        // 5. Burn. Exactly one concurrent caller gets the record back.
        let burned = self
            .db
            .burn_record(&id)?
            .ok_or(ProtocolError::UnknownOrBurnedRecord(window))?;

        info!(record_id = %id, %window, tick = now, "record burned, private key released");
        Ok(Reveal {
            k_public,
            k_private: Zeroizing::new(burned.k_private),
        })
    }

    // ── Reset ─────────────────────────────────────────────────────────────────

    /// Wipe the clock, chain, records and nonce ledger and start a new chain.
    ///
    /// Has no protocol-level failure mode; only the storage layer can fail.
    pub fn reset(&self) -> Result<ChainParams, ProtocolError> {
        let mut epoch = self.epoch.write().map_err(|_| poisoned())?;
        let discarded = self.db.record_count();

        let params = fresh_params();
        self.db.wipe()?;
        self.db.put_chain_params(&params)?;
        self.db.put_tick(0)?;
        *epoch = Epoch::new(params.clone(), 0);

        warn!(discarded, seed = %params.seed, "state reset, all records discarded");
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hourglass_crypto::{checksum, extend, ClientVerifier};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn engine() -> ProtocolEngine {
        let db = Arc::new(StateDb::temporary().expect("open temp db"));
        ProtocolEngine::open(db, EngineConfig::default()).expect("open engine")
    }

    fn advance_to(engine: &ProtocolEngine, target: Tick) {
        while engine.status().unwrap().current_tick < target {
            engine.advance_clock().unwrap();
        }
    }

    fn proof(receipt: &EncryptReceipt) -> Digest {
        let history = extend(&receipt.params.seed, &receipt.params.salt, receipt.window.end);
        checksum(&history, &receipt.window).unwrap()
    }

    // ── Status / clock ────────────────────────────────────────────────────────

    #[test]
    fn fresh_engine_starts_at_zero() {
        let e = engine();
        let s = e.status().unwrap();
        assert_eq!(s.current_tick, 0);
        assert_eq!(s.chain_length, 1);
        assert_eq!(e.chain_params().unwrap().salt.len(), SALT_LEN);
    }

    #[test]
    fn each_tick_extends_chain_by_one() {
        let e = engine();
        for expected in 1..=5 {
            assert_eq!(e.advance_clock().unwrap(), expected);
            let s = e.status().unwrap();
            assert_eq!(s.current_tick, expected);
            assert_eq!(s.chain_length, expected + 1);
        }
    }

    // ── Round trip ────────────────────────────────────────────────────────────

    #[test]
    fn deadbeef_round_trip() {
        let e = engine();
        let payload = hex::decode("deadbeef").unwrap();
        let receipt = e.encrypt(&payload, Window::new(2, 4), "enc-1").unwrap();

        advance_to(&e, 4);
        let claim = proof(&receipt);
        let reveal = e
            .verify(claim.as_bytes(), Window::new(2, 4), "ver-1", None)
            .unwrap();
        assert_eq!(reveal.k_public, claim);

        let verifier = ClientVerifier::new(receipt.params.clone());
        let opened = verifier
            .open(&reveal.k_public, &reveal.k_private, &receipt.ciphertext, &receipt.iv)
            .unwrap();
        assert_eq!(hex::encode(opened.as_slice()), "deadbeef");
    }

    #[test]
    fn encrypt_computes_chain_ahead_of_clock() {
        let e = engine();
        e.encrypt(b"k", Window::new(10, 30), "enc").unwrap();
        let s = e.status().unwrap();
        assert_eq!(s.current_tick, 0);
        assert!(s.chain_length >= 31);
    }

    // ── Window validation ─────────────────────────────────────────────────────

    #[test]
    fn unordered_window_rejected() {
        let e = engine();
        for (start, end) in [(4, 4), (5, 4)] {
            let err = e.encrypt(b"k", Window::new(start, end), &format!("n{start}{end}"));
            assert!(matches!(err, Err(ProtocolError::InvalidWindow(_))));
        }
    }

    #[test]
    fn window_beyond_horizon_rejected() {
        let e = engine();
        assert!(e.encrypt(b"k", Window::new(0, 100), "ok").is_ok());
        assert!(matches!(
            e.encrypt(b"k", Window::new(0, 101), "too-far"),
            Err(ProtocolError::InvalidWindow(_))
        ));
        advance_to(&e, 5);
        assert!(e.encrypt(b"k", Window::new(0, 105), "ok-later").is_ok());
    }

    #[test]
    fn window_in_the_past_rejected() {
        let e = engine();
        advance_to(&e, 6);
        assert!(matches!(
            e.encrypt(b"k", Window::new(1, 5), "late"),
            Err(ProtocolError::InvalidWindow(_))
        ));
    }

    #[test]
    fn invalid_window_does_not_consume_nonce() {
        let e = engine();
        assert!(e.encrypt(b"k", Window::new(3, 1), "n").is_err());
        assert!(!e.db.nonce_seen("n"));
        assert!(e.encrypt(b"k", Window::new(1, 3), "n").is_ok());
    }

    #[test]
    fn duplicate_window_rejected() {
        let e = engine();
        let first = e.encrypt(b"a", Window::new(1, 3), "n1").unwrap();
        assert!(matches!(
            e.encrypt(b"b", Window::new(1, 3), "n2"),
            Err(ProtocolError::DuplicateWindow(_))
        ));
        assert_eq!(e.db.record_count(), 1);
        assert_eq!(
            e.db.record_for_window(&Window::new(1, 3)).unwrap(),
            Some(first.record_id)
        );
    }

    // ── Gating ────────────────────────────────────────────────────────────────

    #[test]
    fn correct_checksum_before_unlock_rejected() {
        let e = engine();
        let receipt = e.encrypt(b"k", Window::new(1, 6), "enc").unwrap();
        let claim = proof(&receipt);
        for tick in 0..6 {
            advance_to(&e, tick);
            let err = e
                .verify(claim.as_bytes(), receipt.window, &format!("v{tick}"), None)
                .unwrap_err();
            assert_eq!(
                err,
                ProtocolError::TimeLockNotReached { current: tick, unlock_at: 6 }
            );
        }
        advance_to(&e, 6);
        assert!(e.verify(claim.as_bytes(), receipt.window, "v6", None).is_ok());
    }

    // ── Integrity ─────────────────────────────────────────────────────────────

    #[test]
    fn wrong_checksum_leaves_record_live() {
        let e = engine();
        let receipt = e.encrypt(b"k", Window::new(1, 3), "enc").unwrap();
        advance_to(&e, 3);

        let mut bad = *proof(&receipt).as_bytes();
        bad[0] ^= 0xff;
        assert_eq!(
            e.verify(&bad, receipt.window, "bad", None).unwrap_err(),
            ProtocolError::ChecksumMismatch
        );
        assert_eq!(
            e.verify(&bad[..16], receipt.window, "short", None).unwrap_err(),
            ProtocolError::ChecksumMismatch
        );
        assert!(!e.db.get_record(&receipt.record_id).unwrap().unwrap().burned);

        let good = proof(&receipt);
        assert!(e.verify(good.as_bytes(), receipt.window, "good", None).is_ok());
    }

    // ── Single use ────────────────────────────────────────────────────────────

    #[test]
    fn second_verify_on_window_fails() {
        let e = engine();
        let receipt = e.encrypt(b"k", Window::new(1, 3), "enc").unwrap();
        advance_to(&e, 3);
        let claim = proof(&receipt);
        e.verify(claim.as_bytes(), receipt.window, "v1", None).unwrap();

        for n in 2..5 {
            assert_eq!(
                e.verify(claim.as_bytes(), receipt.window, &format!("v{n}"), None)
                    .unwrap_err(),
                ProtocolError::UnknownOrBurnedRecord(receipt.window)
            );
        }
        // The window stays taken after the burn.
        assert_eq!(
            e.encrypt(b"k", Window::new(1, 3), "enc-again").unwrap_err(),
            ProtocolError::DuplicateWindow(Window::new(1, 3))
        );
    }

    #[test]
    fn unknown_window_rejected() {
        let e = engine();
        advance_to(&e, 3);
        assert_eq!(
            e.verify(&[0u8; 32], Window::new(1, 3), "v", None).unwrap_err(),
            ProtocolError::UnknownOrBurnedRecord(Window::new(1, 3))
        );
    }

    #[test]
    fn record_id_must_match_window() {
        let e = engine();
        let a = e.encrypt(b"a", Window::new(1, 3), "ea").unwrap();
        let b = e.encrypt(b"b", Window::new(2, 3), "eb").unwrap();
        advance_to(&e, 3);

        assert_eq!(
            e.verify(proof(&a).as_bytes(), a.window, "v1", Some(&b.record_id))
                .unwrap_err(),
            ProtocolError::UnknownOrBurnedRecord(a.window)
        );
        assert!(e
            .verify(proof(&a).as_bytes(), a.window, "v2", Some(&a.record_id))
            .is_ok());
    }

    // ── Replay ────────────────────────────────────────────────────────────────

    #[test]
    fn replayed_nonce_rejected_regardless_of_fields() {
        let e = engine();
        let receipt = e.encrypt(b"k", Window::new(1, 3), "shared").unwrap();
        assert_eq!(
            e.encrypt(b"k", Window::new(5, 8), "shared").unwrap_err(),
            ProtocolError::ReplayedNonce
        );

        advance_to(&e, 3);
        let claim = proof(&receipt);
        // Correct in every other respect, but the nonce was used by Encrypt.
        assert_eq!(
            e.verify(claim.as_bytes(), receipt.window, "shared", None)
                .unwrap_err(),
            ProtocolError::ReplayedNonce
        );
        // A failed verify still consumes its nonce.
        assert!(e.verify(&[0u8; 32], receipt.window, "once", None).is_err());
        assert_eq!(
            e.verify(claim.as_bytes(), receipt.window, "once", None)
                .unwrap_err(),
            ProtocolError::ReplayedNonce
        );
        assert!(!e.db.get_record(&receipt.record_id).unwrap().unwrap().burned);
    }

    // ── Concurrency ───────────────────────────────────────────────────────────

    #[test]
    fn parallel_verifies_release_once() {
        let e = engine();
        let receipt = e.encrypt(b"k", Window::new(1, 3), "enc").unwrap();
        advance_to(&e, 3);
        let claim = proof(&receipt);

        let results: Vec<Result<Reveal, ProtocolError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let e = &e;
                    let claim = &claim;
                    let window = receipt.window;
                    s.spawn(move || e.verify(claim.as_bytes(), window, &format!("p{i}"), None))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for r in results.into_iter().filter_map(Result::err) {
            assert_eq!(r, ProtocolError::UnknownOrBurnedRecord(receipt.window));
        }
    }

    #[test]
    fn parallel_encrypts_with_same_nonce_accept_once() {
        let e = engine();
        let accepted: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8u64)
                .map(|i| {
                    let e = &e;
                    s.spawn(move || e.encrypt(b"k", Window::new(i, i + 1), "dup").is_ok())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap() as usize).sum()
        });
        assert_eq!(accepted, 1);
        assert_eq!(e.db.record_count(), 1);
    }

    #[test]
    fn parallel_encrypts_on_one_window_seal_once() {
        let e = engine();
        let window = Window::new(2, 6);
        let results: Vec<Result<EncryptReceipt, ProtocolError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let e = &e;
                    s.spawn(move || e.encrypt(b"k", window, &format!("w{i}")))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let sealed: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(sealed.len(), 1);
        for r in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(*r, ProtocolError::DuplicateWindow(window));
        }
        assert_eq!(e.db.record_count(), 1);
        assert_eq!(
            e.db.record_for_window(&window).unwrap(),
            Some(sealed[0].record_id.clone())
        );
    }

    #[test]
    fn ticks_during_encrypts_keep_chain_consistent() {
        let e = engine();
        std::thread::scope(|s| {
            let e = &e;
            s.spawn(move || {
                for _ in 0..50 {
                    e.advance_clock().unwrap();
                }
            });
            for i in 0..20u64 {
                let _ = e.encrypt(b"k", Window::new(i + 40, i + 90), &format!("c{i}"));
            }
        });
        let params = e.chain_params().unwrap();
        let s = e.status().unwrap();
        let expected = extend(&params.seed, &params.salt, s.chain_length - 1);
        let epoch = e.epoch().unwrap();
        let chain = epoch.chain.lock().unwrap();
        assert_eq!(chain.history(), expected.as_slice());
    }

    // ── Reset ─────────────────────────────────────────────────────────────────

    #[test]
    fn reset_wipes_everything() {
        let e = engine();
        let before = e.chain_params().unwrap();
        let receipt = e.encrypt(b"k", Window::new(1, 3), "enc").unwrap();
        advance_to(&e, 3);
        let claim = proof(&receipt);

        let after = e.reset().unwrap();
        assert_ne!(before, after);
        assert_eq!(e.chain_params().unwrap(), after);
        assert_eq!(
            e.status().unwrap(),
            Status { current_tick: 0, chain_length: 1 }
        );
        assert_eq!(e.db.record_count(), 0);

        // The old record is gone for good, and the ledger was cleared.
        advance_to(&e, 3);
        assert_eq!(
            e.verify(claim.as_bytes(), receipt.window, "enc", None).unwrap_err(),
            ProtocolError::UnknownOrBurnedRecord(receipt.window)
        );
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    #[test]
    fn reopen_resumes_clock_and_records() {
        let dir = std::env::temp_dir().join(format!("hourglass_engine_reopen_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let (receipt, params) = {
            let db = Arc::new(StateDb::open(&dir).unwrap());
            let e = ProtocolEngine::open(Arc::clone(&db), EngineConfig::default()).unwrap();
            let receipt = e.encrypt(b"persisted", Window::new(2, 5), "enc").unwrap();
            advance_to(&e, 3);
            let params = e.chain_params().unwrap();
            db.flush().unwrap();
            (receipt, params)
        };

        let db = Arc::new(StateDb::open(&dir).unwrap());
        let e = ProtocolEngine::open(db, EngineConfig::default()).unwrap();
        assert_eq!(e.chain_params().unwrap(), params);
        assert_eq!(
            e.status().unwrap(),
            Status { current_tick: 3, chain_length: 4 }
        );
        assert_eq!(
            e.encrypt(b"again", Window::new(6, 7), "enc").unwrap_err(),
            ProtocolError::ReplayedNonce
        );

        advance_to(&e, 5);
        let reveal = e
            .verify(proof(&receipt).as_bytes(), receipt.window, "ver", None)
            .unwrap();
        let opened = ClientVerifier::new(params)
            .open(&reveal.k_public, &reveal.k_private, &receipt.ciphertext, &receipt.iv)
            .unwrap();
        assert_eq!(opened.as_slice(), b"persisted");

        drop(e);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
