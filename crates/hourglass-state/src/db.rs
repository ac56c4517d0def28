use hourglass_core::error::ProtocolError;
use hourglass_core::record::TimeLockRecord;
use hourglass_core::types::{ChainParams, RecordId, Tick, Window};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::Path;

const META_PARAMS: &str = "chain_params";
const META_TICK: &str = "tick";

fn storage(e: sled::Error) -> ProtocolError {
    ProtocolError::Storage(e.to_string())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    bincode::serialize(value).map_err(|e| ProtocolError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    bincode::deserialize(bytes).map_err(|e| ProtocolError::Serialization(e.to_string()))
}

/// Persistent protocol state backed by sled.
///
/// Named trees:
///   records: RecordId bytes          → bincode(TimeLockRecord)
///   windows: BE64(start) ‖ BE64(end) → RecordId bytes
///   nonces:  request nonce bytes      → [] (membership set)
///   meta:    utf8 key bytes           → raw bytes (chain params, tick)
///
/// Every check-then-write in the protocol is a single `compare_and_swap` or
/// one sled transaction, so concurrent callers cannot both win.
pub struct StateDb {
    _db: sled::Db,
    records: sled::Tree,
    windows: sled::Tree,
    nonces: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProtocolError> {
        let db = sled::open(path).map_err(storage)?;
        Self::from_db(db)
    }

    /// Throwaway database, removed when dropped.
    pub fn temporary() -> Result<Self, ProtocolError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(storage)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, ProtocolError> {
        let records = db.open_tree("records").map_err(storage)?;
        let windows = db.open_tree("windows").map_err(storage)?;
        let nonces  = db.open_tree("nonces").map_err(storage)?;
        let meta    = db.open_tree("meta").map_err(storage)?;
        Ok(Self { _db: db, records, windows, nonces, meta })
    }

    // ── Records ──────────────────────────────────────────────────────────────

    pub fn get_record(&self, id: &RecordId) -> Result<Option<TimeLockRecord>, ProtocolError> {
        match self.records.get(id.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Store a new record and bind its window to it in one transaction over
    /// `records` and `windows`. Returns false, writing nothing, if the window
    /// already has a record.
    pub fn insert_record(&self, record: &TimeLockRecord) -> Result<bool, ProtocolError> {
        let bytes = encode(record)?;
        let key = record.window.key_bytes().to_vec();
        let id = record.id.as_bytes().to_vec();

        let outcome = (&self.records, &self.windows).transaction(
            |(records, windows)| -> Result<bool, ConflictableTransactionError<()>> {
                if windows.get(&key)?.is_some() {
                    return Ok(false);
                }
                records.insert(id.clone(), bytes.clone())?;
                windows.insert(key.clone(), id.clone())?;
                Ok(true)
            },
        );

        outcome.map_err(|e| match e {
            TransactionError::Storage(e) => storage(e),
            TransactionError::Abort(()) => {
                ProtocolError::Storage("record insert aborted".into())
            }
        })
    }

    /// Flip `burned` false → true with a compare-and-swap against the stored
    /// bytes. Returns the burned record only to the single caller whose swap
    /// landed; `None` if the record is missing or already burned.
    pub fn burn_record(&self, id: &RecordId) -> Result<Option<TimeLockRecord>, ProtocolError> {
        let Some(current) = self.records.get(id.as_bytes()).map_err(storage)? else {
            return Ok(None);
        };
        let record: TimeLockRecord = decode(&current)?;
        if record.burned {
            return Ok(None);
        }
        let burned = record.into_burned();
        let swapped = self
            .records
            .compare_and_swap(id.as_bytes(), Some(&current), Some(encode(&burned)?))
            .map_err(storage)?;
        Ok(swapped.ok().map(|()| burned))
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    // ── Window index ─────────────────────────────────────────────────────────

    pub fn record_for_window(&self, window: &Window) -> Result<Option<RecordId>, ProtocolError> {
        match self.windows.get(window.key_bytes()).map_err(storage)? {
            Some(bytes) => {
                let arr: [u8; 32] = bytes[..].try_into().map_err(|_| {
                    ProtocolError::Serialization(format!("corrupt window index entry for {window}"))
                })?;
                Ok(Some(RecordId::from_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    // ── Nonce ledger ─────────────────────────────────────────────────────────

    /// Atomic check-and-insert. True if the nonce was unseen (and is now recorded).
    pub fn admit_nonce(&self, nonce: &str) -> Result<bool, ProtocolError> {
        let swapped = self
            .nonces
            .compare_and_swap(nonce.as_bytes(), None::<&[u8]>, Some(Vec::<u8>::new()))
            .map_err(storage)?;
        Ok(swapped.is_ok())
    }

    pub fn nonce_seen(&self, nonce: &str) -> bool {
        self.nonces.contains_key(nonce.as_bytes()).unwrap_or(false)
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), ProtocolError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage)?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, ProtocolError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage)
    }

    pub fn get_chain_params(&self) -> Result<Option<ChainParams>, ProtocolError> {
        match self.get_meta(META_PARAMS)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_chain_params(&self, params: &ChainParams) -> Result<(), ProtocolError> {
        self.put_meta(META_PARAMS, &encode(params)?)
    }

    pub fn get_tick(&self) -> Result<Option<Tick>, ProtocolError> {
        match self.get_meta(META_TICK)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    ProtocolError::Serialization("corrupt tick entry".into())
                })?;
                Ok(Some(Tick::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_tick(&self, tick: Tick) -> Result<(), ProtocolError> {
        self.put_meta(META_TICK, &tick.to_be_bytes())
    }

    /// Drop every record, window binding, nonce and meta entry.
    pub fn wipe(&self) -> Result<(), ProtocolError> {
        self.records.clear().map_err(storage)?;
        self.windows.clear().map_err(storage)?;
        self.nonces.clear().map_err(storage)?;
        self.meta.clear().map_err(storage)?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), ProtocolError> {
        self._db.flush().map_err(storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hourglass_core::constants::{IV_LEN, SECRET_LEN};
    use hourglass_core::types::Digest;

    fn record(byte: u8, window: Window) -> TimeLockRecord {
        TimeLockRecord {
            id: RecordId::from_bytes([byte; 32]),
            window,
            k_private: [byte; SECRET_LEN],
            ciphertext: vec![byte; 20],
            iv: [byte; IV_LEN],
            burned: false,
            created_tick: 0,
            created_at: 0,
        }
    }

    #[test]
    fn nonce_admitted_once() {
        let db = StateDb::temporary().unwrap();
        assert!(!db.nonce_seen("n-1"));
        assert!(db.admit_nonce("n-1").unwrap());
        assert!(!db.admit_nonce("n-1").unwrap());
        assert!(db.nonce_seen("n-1"));
        assert!(db.admit_nonce("n-2").unwrap());
    }

    #[test]
    fn window_bound_once() {
        let db = StateDb::temporary().unwrap();
        let w = Window::new(2, 4);
        let a = record(1, w);
        let b = record(2, w);
        assert!(db.insert_record(&a).unwrap());
        assert!(!db.insert_record(&b).unwrap());
        assert_eq!(db.record_for_window(&w).unwrap(), Some(a.id.clone()));
        assert_eq!(db.record_for_window(&Window::new(2, 5)).unwrap(), None);
    }

    #[test]
    fn losing_insert_leaves_no_orphan() {
        let db = StateDb::temporary().unwrap();
        let w = Window::new(1, 3);
        assert!(db.insert_record(&record(1, w)).unwrap());
        assert!(!db.insert_record(&record(2, w)).unwrap());
        assert_eq!(db.record_count(), 1);
        assert!(db.get_record(&RecordId::from_bytes([2u8; 32])).unwrap().is_none());
    }

    #[test]
    fn concurrent_inserts_on_one_window_have_one_winner() {
        let db = StateDb::temporary().unwrap();
        let w = Window::new(5, 9);
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (1..=8u8)
                .map(|b| {
                    let db = &db;
                    s.spawn(move || db.insert_record(&record(b, w)).unwrap() as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
        assert_eq!(db.record_count(), 1);
        let bound = db.record_for_window(&w).unwrap().unwrap();
        assert!(db.get_record(&bound).unwrap().is_some());
    }

    #[test]
    fn burn_succeeds_exactly_once() {
        let db = StateDb::temporary().unwrap();
        let r = record(5, Window::new(1, 3));
        assert!(db.insert_record(&r).unwrap());

        let burned = db.burn_record(&r.id).unwrap().expect("first burn wins");
        assert!(burned.burned);
        assert!(db.burn_record(&r.id).unwrap().is_none());
        assert!(db.get_record(&r.id).unwrap().unwrap().burned);
        assert!(db
            .burn_record(&RecordId::from_bytes([0xee; 32]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn concurrent_burns_have_one_winner() {
        let db = StateDb::temporary().unwrap();
        let r = record(6, Window::new(1, 3));
        assert!(db.insert_record(&r).unwrap());

        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| db.burn_record(&r.id).unwrap().is_some()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap() as usize).sum()
        });
        assert_eq!(winners, 1);
    }

    #[test]
    fn meta_round_trip_and_wipe() {
        let db = StateDb::temporary().unwrap();
        assert_eq!(db.get_tick().unwrap(), None);
        let params = ChainParams {
            seed: Digest::from_bytes([1u8; 32]),
            salt: vec![2u8; 32],
        };
        db.put_chain_params(&params).unwrap();
        db.put_tick(42).unwrap();
        assert!(db.insert_record(&record(7, Window::new(0, 1))).unwrap());
        db.admit_nonce("x").unwrap();

        assert_eq!(db.get_chain_params().unwrap(), Some(params));
        assert_eq!(db.get_tick().unwrap(), Some(42));

        db.wipe().unwrap();
        assert_eq!(db.get_chain_params().unwrap(), None);
        assert_eq!(db.get_tick().unwrap(), None);
        assert_eq!(db.record_count(), 0);
        assert!(!db.nonce_seen("x"));
    }
}
