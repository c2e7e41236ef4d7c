//! Session-scoped format registry
//!
//! A DataFlash stream defines its own schema: `FMT` records describe every
//! other record type and must appear before the first record of that type.
//! The registry starts with the `FMT` descriptor only and grows as the
//! parsers meet new `FMT` records. Registering a descriptor whose name or
//! type code is already present replaces the old entry, and the old entry
//! disappears from the other index too.
//!
//! One registry belongs to one log. Running a second pass over the same
//! registry starts from whatever the first pass registered; clone the
//! registry (or build a fresh one) for independent passes.

use crate::types::{FormatDescriptor, Record};
use crate::vehicle::{VehicleSession, VehicleType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FormatRegistry {
    by_name: HashMap<String, Arc<FormatDescriptor>>,
    by_code: HashMap<u8, Arc<FormatDescriptor>>,
    session: VehicleSession,
}

impl FormatRegistry {
    /// A registry seeded with the bootstrap `FMT` descriptor
    pub fn new() -> Self {
        let mut registry = Self {
            by_name: HashMap::new(),
            by_code: HashMap::new(),
            session: VehicleSession::default(),
        };
        registry.register(FormatDescriptor::bootstrap());
        registry
    }

    /// Insert a descriptor, replacing any entry with the same name or code.
    ///
    /// A replaced descriptor is removed under both its name and its code.
    pub fn register(&mut self, descriptor: FormatDescriptor) -> Arc<FormatDescriptor> {
        let descriptor = Arc::new(descriptor);
        debug!(
            "Registered format {} (type {}, length {}, types {})",
            descriptor.name, descriptor.type_code, descriptor.length, descriptor.types
        );
        if let Some(old) = self
            .by_code
            .insert(descriptor.type_code, Arc::clone(&descriptor))
        {
            if old.name != descriptor.name {
                self.drop_name_if_owned(&old);
            }
        }
        if let Some(old) = self
            .by_name
            .insert(descriptor.name.clone(), Arc::clone(&descriptor))
        {
            if old.type_code != descriptor.type_code {
                self.drop_code_if_owned(&old);
            }
        }
        descriptor
    }

    fn drop_name_if_owned(&mut self, old: &Arc<FormatDescriptor>) {
        if self
            .by_name
            .get(&old.name)
            .is_some_and(|current| Arc::ptr_eq(current, old))
        {
            debug!("Format {} lost type {}", old.name, old.type_code);
            self.by_name.remove(&old.name);
        }
    }

    fn drop_code_if_owned(&mut self, old: &Arc<FormatDescriptor>) {
        if self
            .by_code
            .get(&old.type_code)
            .is_some_and(|current| Arc::ptr_eq(current, old))
        {
            debug!("Type {} lost format {}", old.type_code, old.name);
            self.by_code.remove(&old.type_code);
        }
    }

    /// Register the layout carried by a decoded `FMT` record
    pub fn register_schema_record(&mut self, record: &Record) -> crate::Result<Arc<FormatDescriptor>> {
        let descriptor = FormatDescriptor::from_schema_record(record)?;
        Ok(self.register(descriptor))
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<FormatDescriptor>> {
        self.by_name.get(name)
    }

    pub fn by_code(&self, code: u8) -> Option<&Arc<FormatDescriptor>> {
        self.by_code.get(&code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Descriptors ordered by type code
    pub fn descriptors(&self) -> Vec<&Arc<FormatDescriptor>> {
        let mut descriptors: Vec<_> = self.by_code.values().collect();
        descriptors.sort_by_key(|d| d.type_code);
        descriptors
    }

    pub fn session(&self) -> &VehicleSession {
        &self.session
    }

    pub fn vehicle(&self) -> Option<VehicleType> {
        self.session.vehicle()
    }

    /// Hook for a build decoder that has identified the vehicle family.
    /// Accepts names such as `Copter` or `ArduPlane`; returns false when the
    /// name is not recognised or a family was already set.
    pub fn notify_vehicle(&mut self, family: &str) -> bool {
        match family.parse::<VehicleType>() {
            Ok(vehicle) => self.set_vehicle(vehicle),
            Err(e) => {
                debug!("Ignoring vehicle notification: {}", e);
                false
            }
        }
    }

    pub fn set_vehicle(&mut self, vehicle: VehicleType) -> bool {
        let changed = self.session.notify(vehicle, None);
        if changed {
            debug!("Vehicle family set to {}", vehicle);
        }
        changed
    }

    /// Look for a firmware banner in a decoded record (`MSG.Message`, `VER.FWS`)
    pub fn observe_build_record(&mut self, record: &Record) {
        if self.session.vehicle().is_some() {
            return;
        }
        let banner = record.message().or_else(|| record.firmware_string());
        if let Some(text) = banner {
            if self.session.observe_message(text) {
                debug!(
                    "Detected vehicle {:?} from {} record",
                    self.session.vehicle(),
                    record.name()
                );
            }
        }
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
