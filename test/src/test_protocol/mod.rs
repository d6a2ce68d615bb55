//! Minimal test protocol.
//!
//! Everything in here is what the code-generation collaborator would emit
//! from declarative field/method annotations: component structs whose fields
//! are `Property` cells, hand-written `Replicate` impls obeying the
//! declaration-order rules, caller stubs that serialize arguments, and
//! receiver trampolines that deserialize them and invoke the user method.

use std::any::Any;

use mimic_client::Client;
use mimic_shared::{
    ByteReader, ByteWriter, CallKind, CallTrampoline, ComponentIndex, ComponentKind, DiffMask,
    FieldSchema, FuncId, ObjectId, Property, PropertyMutator, Protocol, Quat,
    RemoteCallDescriptor, Replicate, RoleGuard, Serde, SerdeErr, Vec3,
};

// Transform

/// Pose-bearing component fed into snapshot buffering on the client
pub struct Transform {
    pub position: Property<Vec3>,
    pub rotation: Property<Quat>,
}

impl Transform {
    pub const FIELDS: &'static [FieldSchema] = &[
        FieldSchema {
            name: "position",
            type_name: "Vec3",
        },
        FieldSchema {
            name: "rotation",
            type_name: "Quat",
        },
    ];

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position: Property::new(position, 0),
            rotation: Property::new(rotation, 1),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

impl Replicate for Transform {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<Transform>()
    }

    fn field_count(&self) -> u8 {
        Self::FIELDS.len() as u8
    }

    fn set_mutator(&mut self, mutator: &PropertyMutator) {
        self.position.set_mutator(mutator);
        self.rotation.set_mutator(mutator);
    }

    fn write_full(&self, writer: &mut ByteWriter) {
        self.position.write(writer);
        self.rotation.write(writer);
    }

    fn write_delta(&self, mask: &DiffMask, writer: &mut ByteWriter) {
        mask.ser(writer);
        if mask.bit(0) {
            self.position.write(writer);
        }
        if mask.bit(1) {
            self.rotation.write(writer);
        }
    }

    fn read_full(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        self.position.read(reader)?;
        self.rotation.read(reader)?;
        Ok(())
    }

    fn read_delta(&mut self, reader: &mut ByteReader) -> Result<DiffMask, SerdeErr> {
        let mask = DiffMask::de(reader)?;
        if mask.bit(0) {
            self.position.read(reader)?;
        }
        if mask.bit(1) {
            self.rotation.read(reader)?;
        }
        Ok(mask)
    }

    fn to_any(&self) -> &dyn Any {
        self
    }

    fn to_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// Stats

/// Six-field component, wide enough to exercise sparse delta masks
pub struct Stats {
    pub level: Property<u8>,
    pub health: Property<u16>,
    pub mana: Property<u16>,
    pub strength: Property<u32>,
    pub label: Property<String>,
    pub alive: Property<bool>,
}

impl Stats {
    pub const FIELDS: &'static [FieldSchema] = &[
        FieldSchema {
            name: "level",
            type_name: "u8",
        },
        FieldSchema {
            name: "health",
            type_name: "u16",
        },
        FieldSchema {
            name: "mana",
            type_name: "u16",
        },
        FieldSchema {
            name: "strength",
            type_name: "u32",
        },
        FieldSchema {
            name: "label",
            type_name: "String",
        },
        FieldSchema {
            name: "alive",
            type_name: "bool",
        },
    ];
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            level: Property::new(0, 0),
            health: Property::new(0, 1),
            mana: Property::new(0, 2),
            strength: Property::new(0, 3),
            label: Property::new(String::new(), 4),
            alive: Property::new(false, 5),
        }
    }
}

impl Replicate for Stats {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<Stats>()
    }

    fn field_count(&self) -> u8 {
        Self::FIELDS.len() as u8
    }

    fn set_mutator(&mut self, mutator: &PropertyMutator) {
        self.level.set_mutator(mutator);
        self.health.set_mutator(mutator);
        self.mana.set_mutator(mutator);
        self.strength.set_mutator(mutator);
        self.label.set_mutator(mutator);
        self.alive.set_mutator(mutator);
    }

    fn write_full(&self, writer: &mut ByteWriter) {
        self.level.write(writer);
        self.health.write(writer);
        self.mana.write(writer);
        self.strength.write(writer);
        self.label.write(writer);
        self.alive.write(writer);
    }

    fn write_delta(&self, mask: &DiffMask, writer: &mut ByteWriter) {
        mask.ser(writer);
        if mask.bit(0) {
            self.level.write(writer);
        }
        if mask.bit(1) {
            self.health.write(writer);
        }
        if mask.bit(2) {
            self.mana.write(writer);
        }
        if mask.bit(3) {
            self.strength.write(writer);
        }
        if mask.bit(4) {
            self.label.write(writer);
        }
        if mask.bit(5) {
            self.alive.write(writer);
        }
    }

    fn read_full(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        self.level.read(reader)?;
        self.health.read(reader)?;
        self.mana.read(reader)?;
        self.strength.read(reader)?;
        self.label.read(reader)?;
        self.alive.read(reader)?;
        Ok(())
    }

    fn read_delta(&mut self, reader: &mut ByteReader) -> Result<DiffMask, SerdeErr> {
        let mask = DiffMask::de(reader)?;
        if mask.bit(0) {
            self.level.read(reader)?;
        }
        if mask.bit(1) {
            self.health.read(reader)?;
        }
        if mask.bit(2) {
            self.mana.read(reader)?;
        }
        if mask.bit(3) {
            self.strength.read(reader)?;
        }
        if mask.bit(4) {
            self.label.read(reader)?;
        }
        if mask.bit(5) {
            self.alive.read(reader)?;
        }
        Ok(mask)
    }

    fn to_any(&self) -> &dyn Any {
        self
    }

    fn to_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// Monster

/// Component with an inheritance chain: the `Creature` base segment is
/// flattened in first, so its fields own the low dirty-mask bits and the
/// derived fields continue numbering where the base left off.
pub struct Monster {
    // Creature (base segment)
    pub health: Property<u16>,
    pub stamina: Property<u16>,
    // Monster (derived segment)
    pub rage: Property<u8>,
}

impl Monster {
    pub const CREATURE_FIELDS: &'static [FieldSchema] = &[
        FieldSchema {
            name: "health",
            type_name: "u16",
        },
        FieldSchema {
            name: "stamina",
            type_name: "u16",
        },
    ];

    pub const FIELDS: &'static [FieldSchema] = &[FieldSchema {
        name: "rage",
        type_name: "u8",
    }];
}

impl Default for Monster {
    fn default() -> Self {
        Self {
            health: Property::new(0, 0),
            stamina: Property::new(0, 1),
            rage: Property::new(0, 2),
        }
    }
}

impl Replicate for Monster {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<Monster>()
    }

    fn field_count(&self) -> u8 {
        (Self::CREATURE_FIELDS.len() + Self::FIELDS.len()) as u8
    }

    fn set_mutator(&mut self, mutator: &PropertyMutator) {
        self.health.set_mutator(mutator);
        self.stamina.set_mutator(mutator);
        self.rage.set_mutator(mutator);
    }

    fn write_full(&self, writer: &mut ByteWriter) {
        self.health.write(writer);
        self.stamina.write(writer);
        self.rage.write(writer);
    }

    fn write_delta(&self, mask: &DiffMask, writer: &mut ByteWriter) {
        mask.ser(writer);
        if mask.bit(0) {
            self.health.write(writer);
        }
        if mask.bit(1) {
            self.stamina.write(writer);
        }
        if mask.bit(2) {
            self.rage.write(writer);
        }
    }

    fn read_full(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        self.health.read(reader)?;
        self.stamina.read(reader)?;
        self.rage.read(reader)?;
        Ok(())
    }

    fn read_delta(&mut self, reader: &mut ByteReader) -> Result<DiffMask, SerdeErr> {
        let mask = DiffMask::de(reader)?;
        if mask.bit(0) {
            self.health.read(reader)?;
        }
        if mask.bit(1) {
            self.stamina.read(reader)?;
        }
        if mask.bit(2) {
            self.rage.read(reader)?;
        }
        Ok(mask)
    }

    fn to_any(&self) -> &dyn Any {
        self
    }

    fn to_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// Combat

/// Component carrying every remote-call shape. State lives in properties so
/// that a call invoked on the server replicates its effects like any other
/// field write.
pub struct Combat {
    pub shots: Property<u32>,
    pub aim: Property<Vec3>,
    pub heals_received: Property<u16>,
    pub detonations: Property<u16>,
    pub taunts: Property<u16>,
    pub rank: Property<u8>,
}

impl Combat {
    pub const FIELDS: &'static [FieldSchema] = &[
        FieldSchema {
            name: "shots",
            type_name: "u32",
        },
        FieldSchema {
            name: "aim",
            type_name: "Vec3",
        },
        FieldSchema {
            name: "heals_received",
            type_name: "u16",
        },
        FieldSchema {
            name: "detonations",
            type_name: "u16",
        },
        FieldSchema {
            name: "taunts",
            type_name: "u16",
        },
        FieldSchema {
            name: "rank",
            type_name: "u8",
        },
    ];

    /// Server-bound; the dispatcher enforces ownership on arrival
    pub fn fire(&mut self, direction: Vec3) {
        self.shots.set(*self.shots + 1);
        self.aim.set(direction);
    }

    /// Server-bound, registered with the ignore-authority flag
    pub fn taunt(&mut self) {
        self.taunts.set(*self.taunts + 1);
    }

    /// Broadcast to every observer; client-only guard
    pub fn explode(&mut self, _power: f32) {
        self.detonations.set(*self.detonations + 1);
    }

    /// Targeted at one connection; owner-only guard
    pub fn heal(&mut self, amount: u16) {
        self.heals_received.set(*self.heals_received + amount);
    }

    /// Server-only guard, used to exercise guard rejection on clients
    pub fn promote(&mut self) {
        self.rank.set(*self.rank + 1);
    }
}

impl Default for Combat {
    fn default() -> Self {
        Self {
            shots: Property::new(0, 0),
            aim: Property::new(Vec3::ZERO, 1),
            heals_received: Property::new(0, 2),
            detonations: Property::new(0, 3),
            taunts: Property::new(0, 4),
            rank: Property::new(0, 5),
        }
    }
}

impl Replicate for Combat {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<Combat>()
    }

    fn field_count(&self) -> u8 {
        Self::FIELDS.len() as u8
    }

    fn set_mutator(&mut self, mutator: &PropertyMutator) {
        self.shots.set_mutator(mutator);
        self.aim.set_mutator(mutator);
        self.heals_received.set_mutator(mutator);
        self.detonations.set_mutator(mutator);
        self.taunts.set_mutator(mutator);
        self.rank.set_mutator(mutator);
    }

    fn write_full(&self, writer: &mut ByteWriter) {
        self.shots.write(writer);
        self.aim.write(writer);
        self.heals_received.write(writer);
        self.detonations.write(writer);
        self.taunts.write(writer);
        self.rank.write(writer);
    }

    fn write_delta(&self, mask: &DiffMask, writer: &mut ByteWriter) {
        mask.ser(writer);
        if mask.bit(0) {
            self.shots.write(writer);
        }
        if mask.bit(1) {
            self.aim.write(writer);
        }
        if mask.bit(2) {
            self.heals_received.write(writer);
        }
        if mask.bit(3) {
            self.detonations.write(writer);
        }
        if mask.bit(4) {
            self.taunts.write(writer);
        }
        if mask.bit(5) {
            self.rank.write(writer);
        }
    }

    fn read_full(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        self.shots.read(reader)?;
        self.aim.read(reader)?;
        self.heals_received.read(reader)?;
        self.detonations.read(reader)?;
        self.taunts.read(reader)?;
        self.rank.read(reader)?;
        Ok(())
    }

    fn read_delta(&mut self, reader: &mut ByteReader) -> Result<DiffMask, SerdeErr> {
        let mask = DiffMask::de(reader)?;
        if mask.bit(0) {
            self.shots.read(reader)?;
        }
        if mask.bit(1) {
            self.aim.read(reader)?;
        }
        if mask.bit(2) {
            self.heals_received.read(reader)?;
        }
        if mask.bit(3) {
            self.detonations.read(reader)?;
        }
        if mask.bit(4) {
            self.taunts.read(reader)?;
        }
        if mask.bit(5) {
            self.rank.read(reader)?;
        }
        Ok(mask)
    }

    fn to_any(&self) -> &dyn Any {
        self
    }

    fn to_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// Stable identifiers, identical on every peer that registers this protocol

pub fn fire_id() -> FuncId {
    FuncId::from_signature("Combat::fire(Vec3)")
}

pub fn taunt_id() -> FuncId {
    FuncId::from_signature("Combat::taunt()")
}

pub fn explode_id() -> FuncId {
    FuncId::from_signature("Combat::explode(f32)")
}

pub fn heal_id() -> FuncId {
    FuncId::from_signature("Combat::heal(u16)")
}

pub fn promote_id() -> FuncId {
    FuncId::from_signature("Combat::promote()")
}

// Caller stubs

/// Serializes the arguments of `Combat::fire` and hands the payload to the
/// client's send path
pub fn send_fire(
    client: &mut Client,
    object_id: &ObjectId,
    component_index: ComponentIndex,
    direction: Vec3,
) {
    let mut writer = ByteWriter::new();
    direction.ser(&mut writer);
    client.send_call(object_id, component_index, fire_id(), &writer.to_bytes());
}

pub fn send_taunt(client: &mut Client, object_id: &ObjectId, component_index: ComponentIndex) {
    client.send_call(object_id, component_index, taunt_id(), &[]);
}

// Receiver trampolines

fn combat_mut(component: &mut dyn Replicate) -> &mut Combat {
    component
        .to_any_mut()
        .downcast_mut::<Combat>()
        .expect("trampoline registered for Combat")
}

fn fire_trampoline() -> CallTrampoline {
    Box::new(|component, reader, _context| {
        let direction = Vec3::de(reader)?;
        combat_mut(component).fire(direction);
        Ok(())
    })
}

fn taunt_trampoline() -> CallTrampoline {
    Box::new(|component, _reader, _context| {
        combat_mut(component).taunt();
        Ok(())
    })
}

fn explode_trampoline() -> CallTrampoline {
    Box::new(|component, reader, _context| {
        let power = f32::de(reader)?;
        combat_mut(component).explode(power);
        Ok(())
    })
}

fn heal_trampoline() -> CallTrampoline {
    Box::new(|component, reader, _context| {
        let amount = u16::de(reader)?;
        combat_mut(component).heal(amount);
        Ok(())
    })
}

fn promote_trampoline() -> CallTrampoline {
    Box::new(|component, _reader, _context| {
        combat_mut(component).promote();
        Ok(())
    })
}

/// Builds the protocol both peers of every test agree on. Registration order
/// fixes the component wire ids, so server and client must call this
/// identically.
pub fn protocol() -> Protocol {
    Protocol::builder()
        .add_component::<Transform>("Transform", &[Transform::FIELDS])
        .add_component::<Stats>("Stats", &[Stats::FIELDS])
        .add_component::<Monster>("Monster", &[Monster::CREATURE_FIELDS, Monster::FIELDS])
        .add_component::<Combat>("Combat", &[Combat::FIELDS])
        .add_remote_call::<Combat>(
            "Combat",
            fire_id(),
            RemoteCallDescriptor::new(
                "Combat::fire",
                CallKind::ServerBound {
                    ignore_authority: false,
                },
                RoleGuard::None,
                fire_trampoline(),
            ),
        )
        .add_remote_call::<Combat>(
            "Combat",
            taunt_id(),
            RemoteCallDescriptor::new(
                "Combat::taunt",
                CallKind::ServerBound {
                    ignore_authority: true,
                },
                RoleGuard::None,
                taunt_trampoline(),
            ),
        )
        .add_remote_call::<Combat>(
            "Combat",
            explode_id(),
            RemoteCallDescriptor::new(
                "Combat::explode",
                CallKind::Broadcast,
                RoleGuard::ClientOnly,
                explode_trampoline(),
            ),
        )
        .add_remote_call::<Combat>(
            "Combat",
            heal_id(),
            RemoteCallDescriptor::new(
                "Combat::heal",
                CallKind::Targeted,
                RoleGuard::OwnerOnly,
                heal_trampoline(),
            ),
        )
        .add_remote_call::<Combat>(
            "Combat",
            promote_id(),
            RemoteCallDescriptor::new(
                "Combat::promote",
                CallKind::Targeted,
                RoleGuard::ServerOnly,
                promote_trampoline(),
            ),
        )
        .build()
        .expect("test protocol failed to build")
}
