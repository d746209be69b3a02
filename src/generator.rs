//! Shared generator that dispatches over every identifier kind.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::name::HashAlgorithm;
use crate::time_based::LocalDomain;
use crate::ulid::MAX_TIMESTAMP;
use crate::{
    clock, random, Error, Identifier, MonotonicUlidGenerator, NameSeed, TimeBasedGenerator, Ulid,
    V7Generator, Version,
};
use inner::{GlobalGenRng, Slot};

/// Arguments of [`IdGenerator::generate`].
///
/// Each identifier kind reads only the arguments it needs and ignores the others.
///
/// | Version         | Reads                                   |
/// | --------------- | --------------------------------------- |
/// | `V2`            | `local` (required)                      |
/// | `V3`, `V5`      | `name_seed` with a matching algorithm   |
/// | `V7`            | `monotonic`                             |
/// | `Ulid`          | `hash`, otherwise `monotonic`           |
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Args<'a> {
    /// Namespace, name and hash function of a name-based UUID.
    pub name_seed: Option<NameSeed<'a>>,
    /// Local domain and local identifier of a DCE Security UUID.
    pub local: Option<(LocalDomain, u32)>,
    /// Whether a UUIDv7 or ULID must sort after the previous one from the same generator.
    pub monotonic: bool,
    /// Millisecond timestamp and name of a hash-derived ULID.
    pub hash: Option<(u64, &'a str)>,
}

impl<'a> Args<'a> {
    /// Creates arguments for a name-based UUID.
    pub const fn name(seed: NameSeed<'a>) -> Self {
        Self {
            name_seed: Some(seed),
            local: None,
            monotonic: false,
            hash: None,
        }
    }

    /// Creates arguments for a DCE Security UUID.
    pub const fn local(domain: LocalDomain, local_id: u32) -> Self {
        Self {
            name_seed: None,
            local: Some((domain, local_id)),
            monotonic: false,
            hash: None,
        }
    }

    /// Creates arguments requesting monotonic order.
    pub const fn monotonic() -> Self {
        Self {
            name_seed: None,
            local: None,
            monotonic: true,
            hash: None,
        }
    }

    /// Creates arguments for a hash-derived ULID.
    pub const fn hash(timestamp: u64, name: &'a str) -> Self {
        Self {
            name_seed: None,
            local: None,
            monotonic: false,
            hash: Some((timestamp, name)),
        }
    }
}

/// Represents a thread-safe generator of every identifier kind.
///
/// The stateful generators (Gregorian time, monotonic UUIDv7 and monotonic ULID) are each kept
/// behind their own mutex, so the order guarantees hold across every thread that shares the same
/// instance. Share one instance through an [`Arc`](std::sync::Arc) or a `static` to obtain
/// process-wide order; separate instances make no promise about each other's output.
///
/// The stateful generators draw random numbers from [`ChaCha12Core`](rand_chacha::ChaCha12Core)
/// reseeded from the operating system every 64 KiB, the strategy [`rand::rngs::ThreadRng`]
/// uses. On Unix, each generator is reset when the process ID changes (i.e., upon process forks)
/// to prevent collisions across processes.
///
/// # Examples
///
/// ```rust
/// use std::{sync::Arc, thread};
/// use cup_uid::{Args, IdGenerator, Version};
///
/// let g = Arc::new(IdGenerator::new());
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 let id = g.generate(Version::Ulid, &Args::monotonic()).unwrap();
///                 println!("{id} by thread {i}");
///             }
///         });
///     }
/// });
/// ```
#[derive(Debug)]
pub struct IdGenerator {
    node: Option<u64>,
    time_based: Mutex<Slot<TimeBasedGenerator<GlobalGenRng>>>,
    v7: Mutex<Slot<V7Generator<GlobalGenRng>>>,
    ulid: Mutex<Slot<MonotonicUlidGenerator<GlobalGenRng>>>,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Creates a generator whose Gregorian-time UUIDs carry a random node identifier.
    pub fn new() -> Self {
        Self::with_node_opt(None)
    }

    /// Creates a generator whose Gregorian-time UUIDs carry the given 48-bit node identifier.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not fit in 48 bits.
    pub fn with_node(node: u64) -> Self {
        assert!(node < 1 << 48, "`node` must be a 48-bit integer");
        Self::with_node_opt(Some(node))
    }

    fn with_node_opt(node: Option<u64>) -> Self {
        Self {
            node,
            time_based: Mutex::new(Slot::new(new_time_based(node))),
            v7: Mutex::new(Slot::new(V7Generator::new(GlobalGenRng::new()))),
            ulid: Mutex::new(Slot::new(MonotonicUlidGenerator::new(GlobalGenRng::new()))),
        }
    }

    /// Generates an identifier of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] when `args` lack what the kind requires (a local
    /// identifier for `V2`, an MD5 seed for `V3`, a SHA-1 seed for `V5`) or the hash timestamp
    /// does not fit in 48 bits. Returns [`Error::Overflow`] when a monotonic ULID cannot be
    /// incremented within the current millisecond or the DCE Security sequence of the current
    /// timestamp window is exhausted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cup_uid::{name::NAMESPACE_DNS, Args, Error, IdGenerator, NameSeed, Version};
    ///
    /// let g = IdGenerator::new();
    /// let seed = NameSeed::sha1(NAMESPACE_DNS, "python.org");
    /// let id = g.generate(Version::V5, &Args::name(seed))?;
    /// assert_eq!(id.to_string(), "886313e1-3b8a-5372-9b90-0c9aee199e5d");
    ///
    /// assert_eq!(
    ///     g.generate(Version::V3, &Args::name(seed)),
    ///     Err(Error::UnsupportedVersion(Version::V3))
    /// );
    /// # Ok::<(), cup_uid::Error>(())
    /// ```
    pub fn generate(&self, version: Version, args: &Args<'_>) -> Result<Identifier, Error> {
        let unsupported = Error::UnsupportedVersion(version);
        let id: Identifier = match version {
            Version::V1 => self.lock_time_based().generate_v1().into(),
            Version::V2 => {
                let (domain, local_id) = args.local.ok_or(unsupported)?;
                self.lock_time_based()
                    .generate_v2(domain, local_id)?
                    .into()
            }
            Version::V3 => name_based(args, HashAlgorithm::Md5)
                .ok_or(unsupported)?
                .into(),
            Version::V4 => random::uuid4_with(&mut rand::thread_rng()).into(),
            Version::V5 => name_based(args, HashAlgorithm::Sha1)
                .ok_or(unsupported)?
                .into(),
            Version::V6 => self.lock_time_based().generate_v6().into(),
            Version::V7 if args.monotonic => self.lock_v7().generate().into(),
            Version::V7 => {
                random::uuid7_with(&mut rand::thread_rng(), clock::unix_ts_ms()).into()
            }
            Version::Ulid => match args.hash {
                Some((timestamp, _)) if timestamp > MAX_TIMESTAMP => return Err(unsupported),
                Some((timestamp, name)) => Ulid::from_hash(timestamp, name).into(),
                None if args.monotonic => self.lock_ulid().generate()?.into(),
                None => random::ulid_with(&mut rand::thread_rng(), clock::unix_ts_ms()).into(),
            },
        };
        Ok(id)
    }

    fn lock_time_based(&self) -> SlotGuard<'_, TimeBasedGenerator<GlobalGenRng>> {
        let node = self.node;
        SlotGuard::new(lock(&self.time_based), move || new_time_based(node))
    }

    fn lock_v7(&self) -> SlotGuard<'_, V7Generator<GlobalGenRng>> {
        SlotGuard::new(lock(&self.v7), || V7Generator::new(GlobalGenRng::new()))
    }

    fn lock_ulid(&self) -> SlotGuard<'_, MonotonicUlidGenerator<GlobalGenRng>> {
        SlotGuard::new(lock(&self.ulid), || {
            MonotonicUlidGenerator::new(GlobalGenRng::new())
        })
    }
}

fn new_time_based(node: Option<u64>) -> TimeBasedGenerator<GlobalGenRng> {
    match node {
        Some(node) => TimeBasedGenerator::with_node(GlobalGenRng::new(), node),
        None => TimeBasedGenerator::new(GlobalGenRng::new()),
    }
}

fn name_based(args: &Args<'_>, algorithm: HashAlgorithm) -> Option<crate::Uuid> {
    args.name_seed
        .filter(|seed| seed.algorithm == algorithm)
        .map(|seed| seed.generate())
}

/// Locks a generator, ignoring poisoning because the state consists of plain integers that a
/// panicking holder cannot leave half-updated.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lock guard that hands out the generator in a [`Slot`], replacing it first if the process has
/// forked since it was created.
struct SlotGuard<'a, G>(MutexGuard<'a, Slot<G>>);

impl<'a, G> SlotGuard<'a, G> {
    fn new(mut guard: MutexGuard<'a, Slot<G>>, init: impl FnOnce() -> G) -> Self {
        guard.reset_upon_pid_change(init);
        Self(guard)
    }
}

impl<G> Deref for SlotGuard<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        &self.0.generator
    }
}

impl<G> DerefMut for SlotGuard<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        &mut self.0.generator
    }
}

mod inner {
    use rand::rngs::{adapter::ReseedingRng, OsRng};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha12Core;

    /// Random number generator of the shared generators.
    ///
    /// Employs [`ChaCha12Core`] with [`ReseedingRng`] wrapper to emulate the strategy used by
    /// [`rand::rngs::ThreadRng`].
    #[derive(Debug)]
    pub struct GlobalGenRng(ReseedingRng<ChaCha12Core, OsRng>);

    impl GlobalGenRng {
        pub fn new() -> Self {
            Self(ReseedingRng::new(
                ChaCha12Core::from_entropy(),
                1024 * 64,
                OsRng,
            ))
        }
    }

    impl RngCore for GlobalGenRng {
        fn next_u32(&mut self) -> u32 {
            self.0.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            self.0.next_u64()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.0.fill_bytes(dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.0.try_fill_bytes(dest)
        }
    }

    /// A thin wrapper to reset the state when the process ID changes (i.e., upon Unix forks).
    #[derive(Debug)]
    pub struct Slot<G> {
        #[cfg(unix)]
        pid: u32,
        pub generator: G,
    }

    impl<G> Slot<G> {
        pub fn new(generator: G) -> Self {
            Self {
                #[cfg(unix)]
                pid: std::process::id(),
                generator,
            }
        }

        /// Replaces the generator with a fresh one from `init` if the process ID has changed.
        #[cfg_attr(not(unix), allow(unused_variables))]
        pub fn reset_upon_pid_change(&mut self, init: impl FnOnce() -> G) {
            #[cfg(unix)]
            if self.pid != std::process::id() {
                *self = Self::new(init());
            }
        }
    }
}
