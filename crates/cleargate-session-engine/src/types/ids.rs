//! Strongly typed identities.
//!
//! Every UUID that crosses a module boundary is wrapped in its own newtype
//! so a node UUID can never be passed where an exit UUID is expected. All
//! wrappers serialize transparently as the bare UUID string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The wrapped UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_type!(
    /// Identity of a [`Session`](crate::runtime::Session).
    SessionUuid
);
uuid_type!(
    /// Identity of a [`Run`](crate::runtime::Run).
    RunUuid
);
uuid_type!(
    /// Identity of a [`Step`](crate::runtime::Step) within a run's path.
    StepUuid
);
uuid_type!(
    /// Identity of a flow definition.
    FlowUuid
);
uuid_type!(
    /// Identity of a node within a flow.
    NodeUuid
);
uuid_type!(
    /// Identity of an exit leaving a node.
    ExitUuid
);
uuid_type!(
    /// Identity of an action within a node.
    ActionUuid
);
uuid_type!(
    /// Identity of a router category.
    CategoryUuid
);
uuid_type!(
    /// Identity of a contact.
    ContactUuid
);
uuid_type!(
    /// Identity of a message.
    MsgUuid
);
