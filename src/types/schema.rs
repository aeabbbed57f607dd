//! The property definitions of the well-known service object types.
//!
//! Definitions live in one submodule per object type (`item`, `message`, `calendar`, `folder`)
//! and are built once, on first use.

use enumset::EnumSet;
use lazy_static::lazy_static;

use super::{
    EmailAddress, ExchangeVersion, ExtendedPropertyCollection, PropertyDefinition,
    PropertyDefinitionFlags as F, PropertyKind, StringList, TimeZoneDefinition,
};

/// Resolves the URI of a `FieldURI` reference to its property definition.
pub trait PropertyDefinitionResolver {
    fn find(&self, uri: &str) -> Option<&'static PropertyDefinition>;
}

/// Properties common to every item.
pub mod item {
    use super::*;

    lazy_static! {
        pub static ref SUBJECT: PropertyDefinition = PropertyDefinition::new(
            "Subject",
            "item:Subject",
            PropertyKind::String,
            F::CanSet | F::CanUpdate | F::CanDelete | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref DATE_TIME_RECEIVED: PropertyDefinition = PropertyDefinition::new(
            "DateTimeReceived",
            "item:DateTimeReceived",
            PropertyKind::DateTime,
            F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref SIZE: PropertyDefinition = PropertyDefinition::new(
            "Size",
            "item:Size",
            PropertyKind::Integer,
            F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref CATEGORIES: PropertyDefinition = PropertyDefinition::new(
            "Categories",
            "item:Categories",
            PropertyKind::Complex(StringList::factory),
            F::AutoInstantiateOnRead | F::CanSet | F::CanUpdate | F::CanDelete | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref IMPORTANCE: PropertyDefinition = PropertyDefinition::new(
            "Importance",
            "item:Importance",
            PropertyKind::Enumeration(&["Low", "Normal", "High"]),
            F::CanSet | F::CanUpdate | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref IS_DRAFT: PropertyDefinition = PropertyDefinition::new(
            "IsDraft",
            "item:IsDraft",
            PropertyKind::Boolean,
            F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref EXTENDED_PROPERTIES: PropertyDefinition = PropertyDefinition::new(
            "ExtendedProperty",
            "item:ExtendedProperty",
            PropertyKind::Complex(ExtendedPropertyCollection::factory),
            F::AutoInstantiateOnRead
                | F::ReuseInstance
                | F::UpdateCollectionItems
                | F::CanSet
                | F::CanUpdate
                | F::CanDelete
                | F::MustBeExplicitlyLoaded,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref EFFECTIVE_RIGHTS: PropertyDefinition = PropertyDefinition::new(
            "EffectiveRights",
            "item:EffectiveRights",
            PropertyKind::EffectiveRights,
            EnumSet::empty(),
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref REMINDER_MINUTES_BEFORE_START: PropertyDefinition = PropertyDefinition::new(
            "ReminderMinutesBeforeStart",
            "item:ReminderMinutesBeforeStart",
            PropertyKind::Integer,
            F::CanSet | F::CanUpdate | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
    }

    pub(super) fn properties() -> Vec<&'static PropertyDefinition> {
        vec![
            &*SUBJECT,
            &*DATE_TIME_RECEIVED,
            &*SIZE,
            &*CATEGORIES,
            &*IMPORTANCE,
            &*IS_DRAFT,
            &*EXTENDED_PROPERTIES,
            &*EFFECTIVE_RIGHTS,
            &*REMINDER_MINUTES_BEFORE_START,
        ]
    }
}

/// Properties of email messages.
pub mod message {
    use super::*;

    lazy_static! {
        pub static ref SENDER: PropertyDefinition = PropertyDefinition::new(
            "Sender",
            "message:Sender",
            PropertyKind::Contained {
                contained_element_name: "Mailbox",
                factory: EmailAddress::factory,
            },
            F::CanSet | F::CanUpdate | F::CanDelete | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref FROM: PropertyDefinition = PropertyDefinition::new(
            "From",
            "message:From",
            PropertyKind::Contained {
                contained_element_name: "Mailbox",
                factory: EmailAddress::factory,
            },
            F::CanSet | F::CanUpdate | F::CanDelete | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref IS_READ_RECEIPT_REQUESTED: PropertyDefinition = PropertyDefinition::new(
            "IsReadReceiptRequested",
            "message:IsReadReceiptRequested",
            PropertyKind::Boolean,
            F::CanSet | F::CanUpdate | F::CanDelete | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref IS_READ: PropertyDefinition = PropertyDefinition::new(
            "IsRead",
            "message:IsRead",
            PropertyKind::Boolean,
            F::CanSet | F::CanUpdate | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
    }

    pub(super) fn properties() -> Vec<&'static PropertyDefinition> {
        vec![&*SENDER, &*IS_READ_RECEIPT_REQUESTED, &*FROM, &*IS_READ]
    }
}

/// Properties of calendar items.
pub mod calendar {
    use super::*;

    lazy_static! {
        pub static ref DURATION: PropertyDefinition = PropertyDefinition::new(
            "Duration",
            "calendar:Duration",
            PropertyKind::TimeSpan,
            F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref MEETING_WORKSPACE_URL: PropertyDefinition = PropertyDefinition::new(
            "MeetingWorkspaceUrl",
            "calendar:MeetingWorkspaceUrl",
            PropertyKind::String,
            F::CanSet | F::CanUpdate | F::CanDelete | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref MEETING_TIME_ZONE: PropertyDefinition = PropertyDefinition::new(
            "MeetingTimeZone",
            "calendar:MeetingTimeZone",
            PropertyKind::Complex(TimeZoneDefinition::factory),
            F::CanSet | F::CanUpdate,
            ExchangeVersion::Exchange2007_SP1,
        );
        /// Read and written as `MeetingTimeZone` when talking to Exchange 2007 SP1.
        pub static ref START_TIME_ZONE: PropertyDefinition = PropertyDefinition::new(
            "StartTimeZone",
            "calendar:StartTimeZone",
            PropertyKind::Complex(TimeZoneDefinition::factory),
            F::CanSet | F::CanUpdate | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref END_TIME_ZONE: PropertyDefinition = PropertyDefinition::new(
            "EndTimeZone",
            "calendar:EndTimeZone",
            PropertyKind::Complex(TimeZoneDefinition::factory),
            F::CanSet | F::CanUpdate | F::CanFind,
            ExchangeVersion::Exchange2010,
        );
    }

    pub(super) fn properties() -> Vec<&'static PropertyDefinition> {
        vec![
            &*DURATION,
            &*MEETING_WORKSPACE_URL,
            &*MEETING_TIME_ZONE,
            &*START_TIME_ZONE,
            &*END_TIME_ZONE,
        ]
    }
}

/// Properties of folders.
pub mod folder {
    use super::*;

    lazy_static! {
        pub static ref DISPLAY_NAME: PropertyDefinition = PropertyDefinition::new(
            "DisplayName",
            "folder:DisplayName",
            PropertyKind::String,
            F::CanSet | F::CanUpdate | F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref TOTAL_COUNT: PropertyDefinition = PropertyDefinition::new(
            "TotalCount",
            "folder:TotalCount",
            PropertyKind::Integer,
            F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref UNREAD_COUNT: PropertyDefinition = PropertyDefinition::new(
            "UnreadCount",
            "folder:UnreadCount",
            PropertyKind::Integer,
            F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
        pub static ref EFFECTIVE_RIGHTS: PropertyDefinition = PropertyDefinition::new(
            "EffectiveRights",
            "folder:EffectiveRights",
            PropertyKind::EffectiveRights,
            F::CanFind,
            ExchangeVersion::Exchange2007_SP1,
        );
    }

    pub(super) fn properties() -> Vec<&'static PropertyDefinition> {
        vec![&*DISPLAY_NAME, &*TOTAL_COUNT, &*UNREAD_COUNT, &*EFFECTIVE_RIGHTS]
    }
}

/// An ordered set of property definitions.
///
/// The order is the order properties are written in.
#[derive(Debug)]
pub struct Schema {
    properties: Vec<&'static PropertyDefinition>,
}

lazy_static! {
    static ref ALL: Schema = Schema::new(
        item::properties()
            .into_iter()
            .chain(message::properties())
            .chain(calendar::properties())
            .chain(folder::properties())
            .collect()
    );
    static ref MESSAGE: Schema = Schema::new(
        item::properties()
            .into_iter()
            .chain(message::properties())
            .collect()
    );
    static ref CALENDAR_ITEM: Schema = Schema::new(
        item::properties()
            .into_iter()
            .chain(calendar::properties())
            .collect()
    );
    static ref FOLDER: Schema = Schema::new(folder::properties());
    static ref VERSION_ALIASES: Vec<VersionAlias> = vec![VersionAlias {
        uri: "calendar:StartTimeZone",
        version: ExchangeVersion::Exchange2007_SP1,
        target: &*calendar::MEETING_TIME_ZONE,
    }];
}

impl Schema {
    pub fn new(properties: Vec<&'static PropertyDefinition>) -> Self {
        Schema { properties }
    }

    /// Every well-known property.
    pub fn global() -> &'static Schema {
        &ALL
    }

    pub fn message() -> &'static Schema {
        &MESSAGE
    }

    pub fn calendar_item() -> &'static Schema {
        &CALENDAR_ITEM
    }

    pub fn folder() -> &'static Schema {
        &FOLDER
    }

    pub fn properties(&self) -> &[&'static PropertyDefinition] {
        &self.properties
    }
}

impl PropertyDefinitionResolver for Schema {
    fn find(&self, uri: &str) -> Option<&'static PropertyDefinition> {
        self.properties.iter().copied().find(|d| d.uri() == uri)
    }
}

/// At `version`, the property `uri` takes its flags and element name from `target`.
struct VersionAlias {
    uri: &'static str,
    version: ExchangeVersion,
    target: &'static PropertyDefinition,
}

pub(crate) fn version_alias(uri: &str, version: ExchangeVersion) -> Option<&'static PropertyDefinition> {
    VERSION_ALIASES
        .iter()
        .find(|alias| alias.uri == uri && alias.version == version)
        .map(|alias| alias.target)
}
