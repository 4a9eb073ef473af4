//! Type descriptors for the Grasp type system
//!
//! Types are nominal: every descriptor lives in a [`TypeArena`] and two
//! types are the same type only when they share a [`TypeId`].

mod typespec;

pub use typespec::{
    ArrayInfo, EnumerationInfo, Form, RecordInfo, SubrangeInfo, TypeArena, TypeId, TypeKind,
    Typespec,
};
