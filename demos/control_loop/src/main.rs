//! Control Loop Example
//!
//! Demonstrates plugboard with a minimal control chain: a sine source
//! plugged into a gain stage, driven by a tick clock the way a real-time
//! host would drive it.

use std::rc::Rc;

use plugboard_core::{
    plug, Clock, ConsoleSink, Entity, Registry, Result, SignalDirection, Value, ValueType,
};
use plugboard_text::value_to_text;

fn register_classes(registry: &mut Registry) -> Result<()> {
    // Sine source: out(t) = sin(frequency * t)
    registry.register_class("sine_source", |class, instance| {
        let mut entity = Entity::new(class, instance);
        let frequency = entity.new_signal("frequency", SignalDirection::In, ValueType::Scalar);
        frequency.set(1.0)?;
        let out = entity.new_signal("out", SignalDirection::Out, ValueType::Scalar);
        out.set_callback(move |t| {
            let f = frequency.get(t)?.as_scalar().unwrap_or_default();
            Ok(Value::Scalar((f * t as f64).sin()))
        });
        Ok(entity)
    })?;

    // Gain stage: out(t) = gain * in(t)
    registry.register_class("gain", |class, instance| {
        let mut entity = Entity::new(class, instance);
        let input = entity.new_signal("in", SignalDirection::In, ValueType::Scalar);
        let gain = entity.new_signal("gain", SignalDirection::In, ValueType::Scalar);
        gain.set(1.0)?;
        let out = entity.new_signal("out", SignalDirection::Out, ValueType::Scalar);
        out.set_callback(move |t| {
            let k = gain.get(t)?.as_scalar().unwrap_or_default();
            let x = input.get(t)?.as_scalar().unwrap_or_default();
            Ok(Value::Scalar(k * x))
        });
        Ok(entity)
    })?;

    Ok(())
}

fn run() -> Result<()> {
    println!("=== Plugboard Control Loop Example ===\n");

    // Configuration phase: register classes, instantiate, wire
    let mut registry = Registry::new();
    registry.add_sink(Rc::new(ConsoleSink));
    register_classes(&mut registry)?;

    let source = registry.create("sine_source", "source")?;
    let amp = registry.create("gain", "amp")?;
    amp.borrow().signal("gain")?.set(2.0)?;

    let source_out = source.borrow().signal("out")?;
    let amp_in = amp.borrow().signal("in")?;
    let amp_out = amp.borrow().signal("out")?;
    plug(&source_out, &amp_in)?;

    println!("{}", source.borrow().describe());
    println!("{}", amp.borrow().describe());

    // Real-time phase: advance the clock and pull the output each cycle
    let mut clock = Clock::new();
    for _ in 0..5 {
        let t = clock.advance();
        let value = amp_out.get(t)?;
        println!("tick {}: amp.out = {}", t, value_to_text(&value));
    }

    println!("\n{}", registry.write_graph());
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
