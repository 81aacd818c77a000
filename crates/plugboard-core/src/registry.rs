//! Entity class catalog and live-instance registry
//!
//! The registry is an explicit value owned by the host process, not a
//! process global. Class registration and instance creation/destruction
//! belong to the configuration phase; the per-cycle recompute path only
//! reads signal handles obtained beforehand. Handles are `Rc`-based and
//! therefore confined to one thread by construction.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::logger::LogSink;

/// Builds one instance of a registered class
///
/// Receives the class name and the instance name; returns the fully
/// declared entity (signals and class commands installed).
pub type ClassBuilder = Rc<dyn Fn(&str, &str) -> Result<Entity>>;

/// Shared handle to a live entity
pub type EntityHandle = Rc<RefCell<Entity>>;

/// Catalog of entity classes and live instances
#[derive(Default)]
pub struct Registry {
    classes: IndexMap<String, ClassBuilder>,
    instances: IndexMap<String, EntityHandle>,
    /// Sinks attached to the logger of every entity created afterwards
    sinks: Vec<Rc<dyn LogSink>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a default log sink for entities created from now on
    pub fn add_sink(&mut self, sink: Rc<dyn LogSink>) {
        self.sinks.push(sink);
    }

    /// Register an entity class
    pub fn register_class(
        &mut self,
        class_name: impl Into<String>,
        builder: impl Fn(&str, &str) -> Result<Entity> + 'static,
    ) -> Result<()> {
        let class_name = class_name.into();
        if self.classes.contains_key(&class_name) {
            return Err(Error::DuplicateClassName(class_name));
        }
        self.classes.insert(class_name, Rc::new(builder));
        Ok(())
    }

    /// Construct and register an instance of a class
    pub fn create(&mut self, class_name: &str, instance_name: &str) -> Result<EntityHandle> {
        let builder = self
            .classes
            .get(class_name)
            .cloned()
            .ok_or_else(|| Error::UnknownEntityClass(class_name.to_string()))?;
        if self.instances.contains_key(instance_name) {
            return Err(Error::DuplicateInstanceName(instance_name.to_string()));
        }
        let entity = builder(class_name, instance_name)?;
        for sink in &self.sinks {
            entity.logger().add_sink(Rc::clone(sink));
        }
        let handle = Rc::new(RefCell::new(entity));
        self.instances
            .insert(instance_name.to_string(), Rc::clone(&handle));
        Ok(handle)
    }

    /// Look up a live instance by name
    pub fn get(&self, instance_name: &str) -> Result<EntityHandle> {
        self.instances
            .get(instance_name)
            .cloned()
            .ok_or_else(|| Error::UnknownEntity(instance_name.to_string()))
    }

    /// Destroy an instance
    ///
    /// Removes the entity and marks its signals destroyed. Plugged signals
    /// elsewhere that pointed into this entity are left alone; their next
    /// read fails with [`Error::UpstreamEntityDestroyed`]. No scan over
    /// the surviving signals happens here.
    pub fn destroy(&mut self, instance_name: &str) -> Result<()> {
        let handle = self
            .instances
            .shift_remove(instance_name)
            .ok_or_else(|| Error::UnknownEntity(instance_name.to_string()))?;
        handle.borrow().mark_destroyed();
        Ok(())
    }

    /// List the registered class names
    pub fn class_names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    /// List the live instance names
    pub fn instance_names(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    /// Render the whole graph in Graphviz DOT text
    ///
    /// Entities become nodes, plug edges become directed edges labeled with
    /// the signal pair. Pure formatting; the host decides where the text
    /// goes.
    pub fn write_graph(&self) -> String {
        let mut out = String::from("digraph plugboard {\n  rankdir=LR;\n");
        for (name, handle) in &self.instances {
            let entity = handle.borrow();
            out.push_str(&format!(
                "  \"{}\" [label=\"{}\\n({})\"];\n",
                name,
                name,
                entity.class_name()
            ));
        }
        for (name, handle) in &self.instances {
            let entity = handle.borrow();
            for signal in entity.signals() {
                if let Some(upstream) = signal.upstream() {
                    out.push_str(&format!(
                        "  \"{}\" -> \"{}\" [label=\"{} -> {}\"];\n",
                        upstream.entity(),
                        name,
                        upstream.name(),
                        signal.name()
                    ));
                }
            }
        }
        out.push_str("}\n");
        out
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("classes", &self.class_names())
            .field("instances", &self.instance_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{plug, SignalDirection};
    use crate::value::{Value, ValueType};

    /// Pass-through class: `out` echoes `in`
    fn register_relay(registry: &mut Registry) {
        registry
            .register_class("relay", |class, instance| {
                let mut entity = Entity::new(class, instance);
                let input = entity.new_signal("in", SignalDirection::In, ValueType::Scalar);
                let out = entity.new_signal("out", SignalDirection::Out, ValueType::Scalar);
                out.set_callback(move |t| input.get(t));
                Ok(entity)
            })
            .unwrap();
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = Registry::new();
        register_relay(&mut registry);
        assert_eq!(registry.class_names(), vec!["relay"]);

        let handle = registry.create("relay", "r1").unwrap();
        assert_eq!(handle.borrow().class_name(), "relay");
        assert_eq!(registry.instance_names(), vec!["r1"]);
        assert!(registry.get("r1").is_ok());
    }

    #[test]
    fn test_duplicate_class_name() {
        let mut registry = Registry::new();
        register_relay(&mut registry);
        let err = registry
            .register_class("relay", |class, instance| Ok(Entity::new(class, instance)))
            .unwrap_err();
        assert_eq!(err, Error::DuplicateClassName("relay".to_string()));
    }

    #[test]
    fn test_unknown_class() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.create("nope", "n1").unwrap_err(),
            Error::UnknownEntityClass("nope".to_string())
        );
    }

    #[test]
    fn test_duplicate_instance_keeps_first_usable() {
        let mut registry = Registry::new();
        register_relay(&mut registry);
        let first = registry.create("relay", "r1").unwrap();
        first.borrow().signal("in").unwrap().set(4.0).unwrap();

        assert_eq!(
            registry.create("relay", "r1").unwrap_err(),
            Error::DuplicateInstanceName("r1".to_string())
        );

        // the first instance is still registered and still works
        let again = registry.get("r1").unwrap();
        assert_eq!(
            again.borrow().signal("out").unwrap().get(1).unwrap(),
            Value::Scalar(4.0)
        );
    }

    #[test]
    fn test_cross_entity_plug_matches_upstream() {
        let mut registry = Registry::new();
        register_relay(&mut registry);
        let a = registry.create("relay", "a").unwrap();
        let b = registry.create("relay", "b").unwrap();

        a.borrow().signal("in").unwrap().set(2.5).unwrap();
        let a_out = a.borrow().signal("out").unwrap();
        let b_in = b.borrow().signal("in").unwrap();
        plug(&a_out, &b_in).unwrap();

        for t in 0..5 {
            assert_eq!(b_in.get(t).unwrap(), a_out.get(t).unwrap());
        }
    }

    #[test]
    fn test_destroy_unknown_instance() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.destroy("ghost").unwrap_err(),
            Error::UnknownEntity("ghost".to_string())
        );
    }

    #[test]
    fn test_destroy_dangles_downstream_plugs() {
        let mut registry = Registry::new();
        register_relay(&mut registry);
        let a = registry.create("relay", "a").unwrap();
        let b = registry.create("relay", "b").unwrap();

        a.borrow().signal("in").unwrap().set(1.0).unwrap();
        let a_out = a.borrow().signal("out").unwrap();
        let b_in = b.borrow().signal("in").unwrap();
        plug(&a_out, &b_in).unwrap();
        assert_eq!(b_in.get(0).unwrap(), Value::Scalar(1.0));

        drop(a);
        registry.destroy("a").unwrap();
        assert!(registry.get("a").is_err());

        // the surviving input stays plugged; reading it reports the
        // destruction instead of crashing
        assert!(matches!(
            b_in.get(1),
            Err(Error::UpstreamEntityDestroyed(_))
        ));

        // re-wiring the input repairs it
        b_in.set(3.0).unwrap();
        assert_eq!(b_in.get(2).unwrap(), Value::Scalar(3.0));
    }

    #[test]
    fn test_write_graph_lists_nodes_and_edges() {
        let mut registry = Registry::new();
        register_relay(&mut registry);
        let a = registry.create("relay", "a").unwrap();
        let b = registry.create("relay", "b").unwrap();

        let a_out = a.borrow().signal("out").unwrap();
        let b_in = b.borrow().signal("in").unwrap();
        plug(&a_out, &b_in).unwrap();

        let dot = registry.write_graph();
        assert!(dot.starts_with("digraph plugboard {"));
        assert!(dot.contains("\"a\" [label=\"a\\n(relay)\"];"));
        assert!(dot.contains("\"a\" -> \"b\" [label=\"out -> in\"];"));
    }
}
