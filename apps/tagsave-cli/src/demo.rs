//! Sample units written by `demo` and read back by `load`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use glam::Vec3;
use tagsave_persist::{
    Category, FieldTable, Grid, Persist, PersistError, Polymorph, TypeRegistry, persist_enum,
};

pub const PROFILE: Category = Category(0);
pub const SETTINGS: Category = Category(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Faction {
    #[default]
    Unaligned,
    Wardens,
    Drifters,
}

persist_enum!(Faction, "demo::Faction", [Unaligned, Wardens, Drifters]);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Item {
    pub name: String,
    pub count: u32,
}

impl Persist for Item {
    const TYPE_NAME: &'static str = "demo::Item";

    fn fields() -> &'static FieldTable<Self> {
        static FIELDS: OnceLock<FieldTable<Item>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::builder()
                .scalar("name", |i: &Item| &i.name, |i: &mut Item| &mut i.name)
                .scalar("count", |i: &Item| &i.count, |i: &mut Item| &mut i.count)
                .build()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Pet {
    pub species: String,
    pub loyalty: u8,
}

impl Persist for Pet {
    const TYPE_NAME: &'static str = "demo::Pet";

    fn fields() -> &'static FieldTable<Self> {
        static FIELDS: OnceLock<FieldTable<Pet>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::builder()
                .scalar("species", |p: &Pet| &p.species, |p: &mut Pet| &mut p.species)
                .scalar("loyalty", |p: &Pet| &p.loyalty, |p: &mut Pet| &mut p.loyalty)
                .build()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mount {
    pub speed: f32,
    pub saddle: bool,
}

impl Persist for Mount {
    const TYPE_NAME: &'static str = "demo::Mount";

    fn fields() -> &'static FieldTable<Self> {
        static FIELDS: OnceLock<FieldTable<Mount>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::builder()
                .scalar("speed", |m: &Mount| &m.speed, |m: &mut Mount| &mut m.speed)
                .build()
        })
    }

    // the saddle is never persisted; a reset puts it back on
    fn reset(&mut self) {
        *self = Self {
            speed: 0.0,
            saddle: true,
        };
    }
}

#[derive(Debug, Default)]
pub struct Profile {
    pub name: String,
    pub level: i32,
    pub position: Vec3,
    pub faction: Faction,
    pub inventory: Vec<Item>,
    pub skills: BTreeMap<String, f32>,
    pub explored: Grid<u8>,
    pub companion: Option<Polymorph>,
}

impl Persist for Profile {
    const TYPE_NAME: &'static str = "demo::Profile";

    fn fields() -> &'static FieldTable<Self> {
        static FIELDS: OnceLock<FieldTable<Profile>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::builder()
                .scalar("name", |p: &Profile| &p.name, |p: &mut Profile| &mut p.name)
                .scalar("level", |p: &Profile| &p.level, |p: &mut Profile| &mut p.level)
                .scalar("position", |p: &Profile| &p.position, |p: &mut Profile| {
                    &mut p.position
                })
                .enumeration("faction", |p: &Profile| &p.faction, |p: &mut Profile| {
                    &mut p.faction
                })
                .list("inventory", |p: &Profile| &p.inventory, |p: &mut Profile| {
                    &mut p.inventory
                })
                .map("skills", |p: &Profile| &p.skills, |p: &mut Profile| &mut p.skills)
                .array("explored", |p: &Profile| &p.explored, |p: &mut Profile| {
                    &mut p.explored
                })
                .class("companion", |p: &Profile| &p.companion, |p: &mut Profile| {
                    &mut p.companion
                })
                .build()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Settings {
    pub volume: f64,
    pub difficulty: u8,
    pub bindings: BTreeMap<String, String>,
}

impl Persist for Settings {
    const TYPE_NAME: &'static str = "demo::Settings";

    fn fields() -> &'static FieldTable<Self> {
        static FIELDS: OnceLock<FieldTable<Settings>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::builder()
                .scalar("volume", |s: &Settings| &s.volume, |s: &mut Settings| &mut s.volume)
                .scalar("difficulty", |s: &Settings| &s.difficulty, |s: &mut Settings| {
                    &mut s.difficulty
                })
                .map("bindings", |s: &Settings| &s.bindings, |s: &mut Settings| {
                    &mut s.bindings
                })
                .build()
        })
    }
}

/// Types that may appear behind a polymorphic field.
pub fn registry() -> Result<TypeRegistry, PersistError> {
    TypeRegistry::new().with::<Pet>()?.with::<Mount>()
}

pub fn sample_profile() -> Profile {
    Profile {
        name: "Ilse".into(),
        level: 14,
        position: Vec3::new(12.5, 0.0, -3.25),
        faction: Faction::Wardens,
        inventory: vec![
            Item {
                name: "lantern".into(),
                count: 1,
            },
            Item {
                name: "arrow".into(),
                count: 36,
            },
            Item {
                name: "bread".into(),
                count: 3,
            },
        ],
        skills: BTreeMap::from([
            ("archery".to_string(), 0.75),
            ("herbalism".to_string(), 0.4),
        ]),
        explored: Grid::new(vec![3, 4], vec![1, 1, 0, 0, 1, 1, 1, 0, 0, 1, 0, 0])
            .unwrap_or_default(),
        companion: Some(Polymorph::new(Pet {
            species: "fox".into(),
            loyalty: 200,
        })),
    }
}

pub fn sample_settings() -> Settings {
    Settings {
        volume: 0.8,
        difficulty: 2,
        bindings: BTreeMap::from([
            ("jump".to_string(), "Space".to_string()),
            ("map".to_string(), "M".to_string()),
        ]),
    }
}
