//! Message Slot End-to-End Smoke Test
//!
//! Drives an in-process device through:
//!   Part A: Lifecycle: load, double registration, bad config, unload
//!   Part B: Dispatch: bind/read/write rules and boundaries
//!   Part C: Trees: order and balance under churn
//!   Part D: Concurrency: many threads on one endpoint
//!
//! Run: ./target/release/msgslot-smoke
//! Set MSGSLOT_LOG_LEVEL=debug to see per-call failures.

use std::sync::Arc;
use std::thread;

use msgslot_core::{kprint, CharDevice, ChannelId, ChannelTree, SlotError, SlotResult};
use msgslot_module::{InProcessRegistrar, MessageSlot, SlotConfig, SlotFile, MSG_SLOT_CHANNEL};

// ── Test harness ──

struct TestRunner {
    total: usize,
    passed: usize,
    failed: usize,
}

const LINE: &str = "────────────────────────────────────────────────────────────";

impl TestRunner {
    fn new() -> Self {
        Self { total: 0, passed: 0, failed: 0 }
    }

    fn section(&self, name: &str) {
        println!("\n{}", LINE);
        println!("  {}", name);
        println!("{}", LINE);
    }

    fn pass(&mut self, name: &str) {
        self.total += 1;
        self.passed += 1;
        println!("  [{:2}] {:<52} PASS", self.total, name);
    }

    fn fail(&mut self, name: &str, reason: &str) {
        self.total += 1;
        self.failed += 1;
        println!("  [{:2}] {:<52} FAIL: {}", self.total, name, reason);
    }

    fn check(&mut self, name: &str, ok: bool, reason: &str) {
        if ok { self.pass(name); } else { self.fail(name, reason); }
    }

    /// Pass if `got` equals `want`, otherwise report both
    fn expect<T: PartialEq + std::fmt::Debug>(&mut self, name: &str, got: T, want: T) {
        let reason = format!("got {:?}, want {:?}", got, want);
        self.check(name, got == want, &reason);
    }

    fn summary(&self) {
        println!("\n{}", LINE);
        println!(
            "  Total: {}  Passed: {}  Failed: {}",
            self.total, self.passed, self.failed
        );
        println!("{}", LINE);
    }
}

/// Open `minor` and bind `channel`
fn bind(dev: &MessageSlot, minor: usize, channel: u64) -> SlotResult<SlotFile> {
    let mut file = dev.open(minor)?;
    dev.ioctl(&mut file, MSG_SLOT_CHANNEL, channel)?;
    Ok(file)
}

fn read(dev: &MessageSlot, file: &SlotFile, capacity: usize) -> SlotResult<Vec<u8>> {
    let mut buf = vec![0u8; capacity];
    let n = dev.read(file, &mut buf[..])?;
    buf.truncate(n);
    Ok(buf)
}

// ════════════════════════════════════════════════════════════
// Part A: Lifecycle
// ════════════════════════════════════════════════════════════

fn test_lifecycle(t: &mut TestRunner) {
    t.section("Part A: Lifecycle");

    let registrar = Arc::new(InProcessRegistrar::new());
    let dev = match MessageSlot::load(SlotConfig::default(), Arc::clone(&registrar)) {
        Ok(d) => { t.pass("load major 235"); d }
        Err(e) => {
            t.fail("load major 235", &e.to_string());
            return;
        }
    };
    t.check("major registered", registrar.is_registered(235), "not in registrar table");

    let second = MessageSlot::load(SlotConfig::default(), Arc::clone(&registrar));
    t.expect(
        "second load on same major",
        second.err(),
        Some(SlotError::RegistrationFailure(libc::EBUSY)),
    );

    let bad = MessageSlot::load_default(SlotConfig::default().max_entries_per_endpoint(0));
    t.expect("load with zero entry budget", bad.err(), Some(SlotError::InvalidArgument));

    let mut stored = 0;
    for minor in [0usize, 1, 255, 259] {
        let ok = dev.open(minor).and_then(|mut f| {
            dev.ioctl(&mut f, MSG_SLOT_CHANNEL, 1)?;
            dev.write(&f, &b"lifecycle"[..])
        });
        if ok.is_ok() {
            stored += 1;
        }
    }
    t.expect("write on minors 0, 1, 255, 259", stored, 4);
    t.expect("open minor 260", dev.open(260).err(), Some(SlotError::InvalidArgument));

    let released = dev.unload();
    t.expect("unload releases every message", released, 4);
    t.check("major unregistered", !registrar.is_registered(235), "still registered");
}

// ════════════════════════════════════════════════════════════
// Part B: Dispatch
// ════════════════════════════════════════════════════════════

fn test_dispatch(t: &mut TestRunner, dev: &MessageSlot) {
    t.section("Part B: Dispatch");

    // B1: end-to-end
    match bind(dev, 0, 42) {
        Ok(mut f) => {
            t.expect("write \"hello\" on 42", dev.write(&f, &b"hello"[..]), Ok(5));
            t.expect("read 42", read(dev, &f, 128), Ok(b"hello".to_vec()));
            let rebound = dev.ioctl(&mut f, MSG_SLOT_CHANNEL, 99);
            t.expect("rebind 99", rebound, Ok(()));
            t.expect("read 99", read(dev, &f, 128), Err(SlotError::NoMessage));
            let _ = dev.ioctl(&mut f, MSG_SLOT_CHANNEL, 42);
            t.expect("read 42 after rebind", read(dev, &f, 128), Ok(b"hello".to_vec()));
            dev.release(f);
        }
        Err(e) => t.fail("bind 42", &e.to_string()),
    }

    // B2: unbound handle
    match dev.open(1) {
        Ok(f) => {
            t.expect("write unbound", dev.write(&f, &b"x"[..]), Err(SlotError::InvalidArgument));
            t.expect("read unbound", read(dev, &f, 128), Err(SlotError::InvalidArgument));
        }
        Err(e) => t.fail("open 1", &e.to_string()),
    }

    // B3: bind rules
    match dev.open(1) {
        Ok(mut f) => {
            t.expect("bind 0", dev.ioctl(&mut f, MSG_SLOT_CHANNEL, 0), Err(SlotError::InvalidArgument));
            t.expect("unknown command", dev.ioctl(&mut f, 0x1234, 5), Err(SlotError::InvalidArgument));
        }
        Err(e) => t.fail("open 1", &e.to_string()),
    }

    // B4: size and capacity boundaries
    match bind(dev, 2, 5) {
        Ok(f) => {
            t.expect("write 128 bytes", dev.write(&f, &[b'm'; 128][..]), Ok(128));
            t.expect("write 129 bytes", dev.write(&f, &[b'm'; 129][..]), Err(SlotError::InvalidArgument));
            t.expect("write 0 bytes", dev.write(&f, &[0u8; 0][..]), Err(SlotError::InvalidArgument));
            let _ = dev.write(&f, &b"0123456789"[..]);
            t.expect("read 10 into 9", read(dev, &f, 9), Err(SlotError::InsufficientSpace));
            t.expect("read 10 into 10", read(dev, &f, 10), Ok(b"0123456789".to_vec()));
        }
        Err(e) => t.fail("bind 5", &e.to_string()),
    }

    // B5: overwrite, non-destructive read, isolation
    match (bind(dev, 3, 3), bind(dev, 3, 7)) {
        (Ok(three), Ok(seven)) => {
            let _ = dev.write(&three, &b"A: the first message"[..]);
            let _ = dev.write(&three, &b"B"[..]);
            t.expect("overwrite A with B", read(dev, &three, 128), Ok(b"B".to_vec()));
            t.expect("second read identical", read(dev, &three, 128), Ok(b"B".to_vec()));
            let _ = dev.write(&seven, &b"seven"[..]);
            t.expect("channel 3 unaffected by 7", read(dev, &three, 128), Ok(b"B".to_vec()));
            t.expect("channel 7", read(dev, &seven, 128), Ok(b"seven".to_vec()));
        }
        _ => t.fail("bind 3 and 7", "bind failed"),
    }

    // B6: messages survive close
    if let Ok(f) = bind(dev, 4, 11) {
        let _ = dev.write(&f, &b"kept"[..]);
        dev.release(f);
    }
    match bind(dev, 4, 11) {
        Ok(f) => t.expect("message survives close", read(dev, &f, 128), Ok(b"kept".to_vec())),
        Err(e) => t.fail("reopen 4", &e.to_string()),
    }
}

// ════════════════════════════════════════════════════════════
// Part C: Trees
// ════════════════════════════════════════════════════════════

fn test_trees(t: &mut TestRunner) {
    t.section("Part C: Trees");

    let mut tree = ChannelTree::new();
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut broken = None;

    for step in 0..20_000 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let raw = ((state >> 33) % 2048) as u32 + 1;
        let Some(id) = ChannelId::new(raw) else { continue };

        if state & 1 == 0 {
            let _ = tree.insert_or_replace(id, &raw.to_le_bytes());
        } else {
            tree.delete(id);
        }
        if let Err(v) = tree.check_invariants() {
            broken = Some(format!("step {}: {}", step, v));
            break;
        }
    }
    t.check(
        "order/balance after 20000 random ops",
        broken.is_none(),
        broken.as_deref().unwrap_or(""),
    );

    let ids = tree.channel_ids();
    t.check("in-order ids strictly increasing", ids.windows(2).all(|w| w[0] < w[1]), "out of order");

    let mut seq = ChannelTree::new();
    for raw in 1..=1023u32 {
        if let Some(id) = ChannelId::new(raw) {
            let _ = seq.insert_or_replace(id, b"s");
        }
    }
    t.expect("1023 sequential inserts: height", seq.height(), 9);
    t.expect("dispose count", seq.dispose(), 1023);
}

// ════════════════════════════════════════════════════════════
// Part D: Concurrency
// ════════════════════════════════════════════════════════════

fn test_concurrency(t: &mut TestRunner, dev: &Arc<MessageSlot>) {
    t.section("Part D: Concurrency");

    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 250;

    let handles: Vec<_> = (0..THREADS)
        .map(|tid| {
            let dev = Arc::clone(dev);
            thread::spawn(move || {
                let mut mismatches = 0u64;
                for i in 0..PER_THREAD {
                    let channel = 10_000 + tid * PER_THREAD + i;
                    let msg = format!("{}:{}", tid, i);
                    let ok = bind(&dev, 200, channel)
                        .and_then(|f| {
                            dev.write(&f, msg.as_bytes())?;
                            read(&dev, &f, 128)
                        })
                        .map(|got| got == msg.as_bytes())
                        .unwrap_or(false);
                    if !ok {
                        mismatches += 1;
                    }
                }
                mismatches
            })
        })
        .collect();

    let mismatches: u64 = handles.into_iter().map(|h| h.join().unwrap_or(u64::MAX)).sum();
    t.expect("per-thread write/read round trips", mismatches, 0);

    let checked = dev.registry().with_endpoint(200, |tree| {
        Ok((tree.len(), tree.check_invariants().is_ok()))
    });
    t.expect(
        "endpoint 200 entries and invariants",
        checked,
        Ok(((THREADS * PER_THREAD) as usize, true)),
    );
}

// ════════════════════════════════════════════════════════════

fn main() {
    kprint::init();
    println!("=== Message Slot Smoke Test ===");

    let mut t = TestRunner::new();

    test_lifecycle(&mut t);

    let dev = match MessageSlot::load_default(SlotConfig::from_env()) {
        Ok(d) => Arc::new(d),
        Err(e) => {
            println!("\nFATAL: load failed: {}", e);
            t.summary();
            std::process::exit(1);
        }
    };

    test_dispatch(&mut t, &dev);
    test_trees(&mut t);
    test_concurrency(&mut t, &dev);

    let stats = dev.stats();
    println!(
        "\n  opens={} binds={} writes={} reads={} errors={} endpoints={} entries={}",
        stats.opens,
        stats.binds,
        stats.writes,
        stats.reads,
        stats.errors,
        stats.registry.active_endpoints,
        stats.registry.total_entries
    );

    t.summary();
    std::process::exit(if t.failed > 0 { 1 } else { 0 });
}
