use blake2::{Blake2b512, Digest};

/// A stable content hash, independent of process or hashmap seed.
///
/// `std::collections::hash_map::DefaultHasher` is explicitly *not*
/// guaranteed stable across runs, which would make store slugs and
/// `locatorHash` keys change from one install to the next. Blake2b gives
/// us a hash that's stable across processes and platforms instead.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StableHash(Vec<u8>);

impl StableHash {
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(data.as_ref());
        StableHash(hasher.finalize().to_vec())
    }

    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }

    pub fn full(&self) -> String {
        hex::encode(&self.0)
    }
}

impl std::fmt::Display for StableHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.short())
    }
}
