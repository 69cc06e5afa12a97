//! Raw transceiver scenarios: loopback round trips, framing errors, and the
//! exact frame shape on the wire.

use pipeflow::{Component, Design, Signal};
use pipeflow_uart::{Uart, UartRx, UartTx};

#[derive(Default)]
struct Probe {
    rdy: usize,
    err: usize,
    words: Vec<u64>,
}

fn observe(design: &Design, rx_rdy: Signal, rx_err: Signal, rx_data: Signal, probe: &mut Probe) {
    if design.is_high(rx_rdy) {
        probe.rdy += 1;
        probe.words.push(design.value(rx_data));
    }
    if design.is_high(rx_err) {
        probe.err += 1;
    }
}

#[test]
fn loopback_round_trip_all_words() {
    let divisor = 3;
    let mut d = Design::new();
    let uart = Uart::new(&mut d, "u", divisor, 8).unwrap();
    d.bind(uart.rx.rx_pin, uart.tx.tx_pin);

    let comps: [&dyn Component; 1] = [&uart];
    let mut probe = Probe::default();
    for word in 0..=255u64 {
        // Wait for the transmitter to go idle.
        let mut waited = 0;
        while !d.is_high(uart.tx.tx_rdy) {
            d.step(&comps).unwrap();
            observe(&d, uart.rx.rx_rdy, uart.rx.rx_err, uart.rx.rx_data, &mut probe);
            waited += 1;
            assert!(waited < 20 * divisor, "tx_rdy never came back");
        }
        d.drive(uart.tx.tx_data, word);
        d.drive(uart.tx.tx_trg, 1);
        d.step(&comps).unwrap();
        observe(&d, uart.rx.rx_rdy, uart.rx.rx_err, uart.rx.rx_data, &mut probe);
        d.drive(uart.tx.tx_trg, 0);
    }
    // Drain the last frame.
    for _ in 0..12 * divisor {
        d.step(&comps).unwrap();
        observe(&d, uart.rx.rx_rdy, uart.rx.rx_err, uart.rx.rx_data, &mut probe);
    }

    assert_eq!(probe.err, 0);
    assert_eq!(probe.rdy, 256);
    assert_eq!(probe.words, (0..=255u64).collect::<Vec<_>>());
}

/// Drives a complete frame onto a receiver pin, LSB-first.
fn drive_frame(design: &mut Design, comps: &[&dyn Component], rx: &UartRx, divisor: usize, word: u64, probe: &mut Probe) {
    let mut level = |design: &mut Design, value: u64, ticks: usize, probe: &mut Probe| {
        design.drive(rx.rx_pin, value);
        for _ in 0..ticks {
            design.step(comps).unwrap();
            observe(design, rx.rx_rdy, rx.rx_err, rx.rx_data, probe);
        }
    };
    level(design, 0, divisor, probe);
    for i in 0..8 {
        level(design, word >> i & 1, divisor, probe);
    }
    level(design, 1, divisor, probe);
}

#[test]
fn three_frames_with_short_gaps() {
    // divisor 8, word 0x95 (high bit set) three times, 2-tick idle gaps.
    let divisor = 8;
    let mut d = Design::new();
    let rx = UartRx::new(&mut d, "u", divisor, 8).unwrap();
    let comps: [&dyn Component; 1] = [&rx];
    let mut probe = Probe::default();

    d.drive(rx.rx_pin, 1);
    for _ in 0..3 {
        d.step(&comps).unwrap();
    }
    for _ in 0..3 {
        drive_frame(&mut d, &comps, &rx, divisor, 0x95, &mut probe);
        d.drive(rx.rx_pin, 1);
        for _ in 0..2 {
            d.step(&comps).unwrap();
            observe(&d, rx.rx_rdy, rx.rx_err, rx.rx_data, &mut probe);
        }
    }
    // Let the trailing pulse land.
    for _ in 0..2 * divisor {
        d.step(&comps).unwrap();
        observe(&d, rx.rx_rdy, rx.rx_err, rx.rx_data, &mut probe);
    }

    assert_eq!(probe.err, 0);
    assert_eq!(probe.rdy, 3);
    assert_eq!(probe.words, vec![0x95, 0x95, 0x95]);
}

#[test]
fn false_start_pulses_err_and_recovers() {
    let divisor = 8;
    let mut d = Design::new();
    let rx = UartRx::new(&mut d, "u", divisor, 8).unwrap();
    let comps: [&dyn Component; 1] = [&rx];
    let mut probe = Probe::default();

    // A clean frame first, so corruption of rx_data would be visible.
    d.drive(rx.rx_pin, 1);
    for _ in 0..3 {
        d.step(&comps).unwrap();
    }
    drive_frame(&mut d, &comps, &rx, divisor, 0x42, &mut probe);
    for _ in 0..2 * divisor {
        d.step(&comps).unwrap();
        observe(&d, rx.rx_rdy, rx.rx_err, rx.rx_data, &mut probe);
    }
    assert_eq!((probe.rdy, probe.err), (1, 0));

    // Glitch: the line dips for two ticks, far less than a bit period, and
    // is back high at the center-sample point.
    d.drive(rx.rx_pin, 0);
    for _ in 0..2 {
        d.step(&comps).unwrap();
        observe(&d, rx.rx_rdy, rx.rx_err, rx.rx_data, &mut probe);
    }
    d.drive(rx.rx_pin, 1);
    for _ in 0..3 * divisor {
        d.step(&comps).unwrap();
        observe(&d, rx.rx_rdy, rx.rx_err, rx.rx_data, &mut probe);
    }
    assert_eq!((probe.rdy, probe.err), (1, 1));
    assert_eq!(d.value(rx.rx_data), 0x42, "a rejected frame must not corrupt rx_data");

    // The receiver is back to listening.
    drive_frame(&mut d, &comps, &rx, divisor, 0xa7, &mut probe);
    for _ in 0..2 * divisor {
        d.step(&comps).unwrap();
        observe(&d, rx.rx_rdy, rx.rx_err, rx.rx_data, &mut probe);
    }
    assert_eq!((probe.rdy, probe.err), (2, 1));
    assert_eq!(probe.words, vec![0x42, 0xa7]);
}

#[test]
fn trigger_is_accepted_the_tick_ready_reasserts() {
    let divisor = 4;
    let mut d = Design::new();
    let tx = UartTx::new(&mut d, "u", divisor, 8).unwrap();
    let comps: [&dyn Component; 1] = [&tx];

    // Offer a new word on every ready tick; each acceptance shows up as a
    // falling edge on tx_rdy. Back-to-back frames must be exactly one frame
    // apart, with no dead ticks between stop bit and the next start bit.
    let mut word = 0x30u64;
    let mut prev_rdy = false;
    let mut tick = 0usize;
    let mut accepted = Vec::new();
    for _ in 0..40 * divisor {
        let rdy = d.is_high(tx.tx_rdy);
        d.drive(tx.tx_trg, rdy as u64);
        if rdy {
            d.drive(tx.tx_data, word);
        }
        d.step(&comps).unwrap();
        tick += 1;
        let now = d.is_high(tx.tx_rdy);
        if prev_rdy && !now {
            accepted.push(tick);
            word += 1;
        }
        prev_rdy = now;
    }

    assert_eq!(accepted.len(), 4, "a continuously offered stream stalled");
    for pair in accepted.windows(2) {
        assert_eq!(pair[1] - pair[0], 10 * divisor + 1, "dead time between frames");
    }
}

#[test]
fn transmit_frame_shape_on_the_wire() {
    let divisor = 4;
    let word = 0xa5u64;
    let mut d = Design::new();
    let tx = UartTx::new(&mut d, "u", divisor, 8).unwrap();
    let comps: [&dyn Component; 1] = [&tx];

    // Let the transmitter reach idle-ready.
    while !d.is_high(tx.tx_rdy) {
        d.step(&comps).unwrap();
    }
    assert_eq!(d.value(tx.tx_pin), 1);

    d.drive(tx.tx_data, word);
    d.drive(tx.tx_trg, 1);
    let mut samples = Vec::new();
    d.step(&comps).unwrap();
    d.drive(tx.tx_trg, 0);
    samples.push(d.value(tx.tx_pin));
    for _ in 0..10 * divisor {
        d.step(&comps).unwrap();
        samples.push(d.value(tx.tx_pin));
        if samples.len() < 10 * divisor {
            assert!(!d.is_high(tx.tx_rdy), "tx_rdy must stay low mid-frame");
        }
    }

    // Start bit, eight data bits LSB-first, stop bit; one divisor each.
    let expect_bit = |i: usize| -> u64 {
        match i {
            0 => 0,
            1..=8 => word >> (i - 1) & 1,
            _ => 1,
        }
    };
    for (k, sample) in samples.iter().enumerate().take(10 * divisor) {
        assert_eq!(*sample, expect_bit(k / divisor), "wire level at tick {k}");
    }
    assert!(d.is_high(tx.tx_rdy), "tx_rdy reasserted after the stop period");
}
