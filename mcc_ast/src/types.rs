//! The C type graph: an arena of type nodes keyed by a stable [`TypeId`].
//! Forward-declared aggregates and enums are allocated incomplete and
//! later *mutated in place* when their definition is parsed, so that every
//! earlier reference to the same `TypeId` sees the completed layout without
//! needing to chase a rewritten pointer.

use bitflags::bitflags;
use mcc_common::{Arena, Id};
use serde::{Deserialize, Serialize};

pub type TypeId = Id<TypeNode>;

bitflags! {
    /// Qualifier bits attached to a type. For a pointer type these describe
    /// the pointer itself, not its pointee (the pointee's own qualifiers
    /// live on the pointee's `TypeNode`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Qualifiers: u8 {
        const CONST    = 0b001;
        const VOLATILE = 0b010;
        const RESTRICT = 0b100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntKind {
    Bool,
    Char,
    Short,
    Int,
    Long,
    LongLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signedness {
    Signed,
    Unsigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatKind {
    Float,
    Double,
    LongDouble,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggKind {
    Struct,
    Union,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeId,
    /// `Some(width)` for a bitfield; width is validated against the
    /// declared type's bit-width by the parser/semantic layer, not here.
    pub bitfield_width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: Option<String>,
    pub ty: TypeId,
}

/// The tagged union of C types from the "C type" data-model entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Void,
    Int(IntKind, Signedness),
    Float(FloatKind),
    Pointer {
        pointee: TypeId,
    },
    Array {
        element: TypeId,
        /// `None` for an incomplete/flexible array.
        length: Option<u64>,
        flexible: bool,
        vla: bool,
    },
    Function {
        ret: TypeId,
        params: Vec<ParamDecl>,
        variadic: bool,
    },
    Aggregate {
        kind: AggKind,
        tag: Option<String>,
        fields: Vec<FieldDecl>,
        complete: bool,
    },
    Enum {
        tag: Option<String>,
        constants: Vec<(String, i64)>,
        complete: bool,
    },
    /// The sentinel "hole" type used while parsing a grouped declarator
    /// (`(*p)[3]`): allocated before the outer suffixes are known, then
    /// overwritten in place once they are.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeNode {
    pub kind: TypeKind,
    pub quals: Qualifiers,
}

/// Owns every `TypeNode` reachable from a translation unit's declarations.
/// Basic/pointer/array/function types are interned by structural equality so
/// that repeated `int *` or `int(int,int)` declarators collapse onto one
/// `TypeId` — the same "equal values may safely share one slot" interning
/// idea ANVIL's own constant pool applies to IR constants, applied here to
/// the type graph instead.
#[derive(Debug, Clone, Default)]
pub struct TypeArena {
    arena: Arena<TypeNode>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, kind: TypeKind, quals: Qualifiers) -> TypeId {
        if let Some((id, _)) = self
            .arena
            .iter()
            .find(|(_, node)| node.kind == kind && node.quals == quals)
        {
            return id;
        }
        self.arena.alloc(TypeNode { kind, quals })
    }

    pub fn get(&self, id: TypeId) -> &TypeNode {
        self.arena.get(id)
    }

    pub fn void(&mut self) -> TypeId {
        self.intern(TypeKind::Void, Qualifiers::empty())
    }

    pub fn int(&mut self, kind: IntKind, signed: Signedness, quals: Qualifiers) -> TypeId {
        self.intern(TypeKind::Int(kind, signed), quals)
    }

    pub fn float(&mut self, kind: FloatKind, quals: Qualifiers) -> TypeId {
        self.intern(TypeKind::Float(kind), quals)
    }

    pub fn pointer(&mut self, pointee: TypeId, quals: Qualifiers) -> TypeId {
        self.intern(TypeKind::Pointer { pointee }, quals)
    }

    pub fn array(&mut self, element: TypeId, length: Option<u64>, flexible: bool, vla: bool) -> TypeId {
        self.intern(
            TypeKind::Array { element, length, flexible, vla },
            Qualifiers::empty(),
        )
    }

    pub fn function(&mut self, ret: TypeId, params: Vec<ParamDecl>, variadic: bool) -> TypeId {
        self.intern(TypeKind::Function { ret, params, variadic }, Qualifiers::empty())
    }

    /// Allocates the "hole" filled in by a grouped declarator; always a
    /// fresh node, never interned (every hole is a distinct placeholder).
    pub fn placeholder(&mut self) -> TypeId {
        self.arena.alloc(TypeNode { kind: TypeKind::Placeholder, quals: Qualifiers::empty() })
    }

    /// Overwrites a placeholder (or, for grouped declarators, fills it with
    /// the fully-constructed inner type) in place.
    pub fn fill_placeholder(&mut self, id: TypeId, node: TypeNode) {
        *self.arena.get_mut(id) = node;
    }

    /// Forward-declares an incomplete aggregate. Always allocates a fresh
    /// node (never interned — two `struct foo;` forward decls of the same
    /// tag in nested scopes are distinct incomplete types until unified by
    /// the caller's tag-scope lookup).
    pub fn declare_aggregate(&mut self, kind: AggKind, tag: Option<String>) -> TypeId {
        self.arena.alloc(TypeNode {
            kind: TypeKind::Aggregate { kind, tag, fields: Vec::new(), complete: false },
            quals: Qualifiers::empty(),
        })
    }

    /// Completes a previously forward-declared aggregate *in place*, so
    /// every `TypeId` handed out by `declare_aggregate` observes the layout.
    pub fn complete_aggregate(&mut self, id: TypeId, fields: Vec<FieldDecl>) {
        let node = self.arena.get_mut(id);
        if let TypeKind::Aggregate { fields: slot, complete, .. } = &mut node.kind {
            *slot = fields;
            *complete = true;
        }
    }

    pub fn declare_enum(&mut self, tag: Option<String>) -> TypeId {
        self.arena.alloc(TypeNode {
            kind: TypeKind::Enum { tag, constants: Vec::new(), complete: false },
            quals: Qualifiers::empty(),
        })
    }

    pub fn complete_enum(&mut self, id: TypeId, constants: Vec<(String, i64)>) {
        let node = self.arena.get_mut(id);
        if let TypeKind::Enum { constants: slot, complete, .. } = &mut node.kind {
            *slot = constants;
            *complete = true;
        }
    }

    pub fn is_complete(&self, id: TypeId) -> bool {
        match &self.get(id).kind {
            TypeKind::Aggregate { complete, .. } | TypeKind::Enum { complete, .. } => *complete,
            TypeKind::Array { length, flexible, .. } => length.is_some() || *flexible,
            _ => true,
        }
    }

    /// Size in bytes for a target with the given pointer width (4 or 8).
    /// Returns `None` for incomplete or function types, matching C's rule
    /// that `sizeof` on those is an error the caller must diagnose.
    pub fn size_of(&self, id: TypeId, pointer_size: u32) -> Option<u32> {
        match &self.get(id).kind {
            TypeKind::Void => None,
            TypeKind::Int(kind, _) => Some(match kind {
                IntKind::Bool | IntKind::Char => 1,
                IntKind::Short => 2,
                IntKind::Int => 4,
                IntKind::Long => pointer_size,
                IntKind::LongLong => 8,
            }),
            TypeKind::Float(kind) => Some(match kind {
                FloatKind::Float => 4,
                FloatKind::Double => 8,
                FloatKind::LongDouble => 16,
            }),
            TypeKind::Pointer { .. } => Some(pointer_size),
            TypeKind::Array { element, length: Some(len), .. } => {
                Some(self.size_of(*element, pointer_size)? * *len as u32)
            }
            TypeKind::Array { length: None, .. } => None,
            TypeKind::Function { .. } => None,
            TypeKind::Aggregate { fields, complete: true, kind, .. } => {
                let align = self.align_of(id, pointer_size)?;
                let raw = match kind {
                    AggKind::Union => fields
                        .iter()
                        .filter_map(|f| self.size_of(f.ty, pointer_size))
                        .max()
                        .unwrap_or(0),
                    AggKind::Struct => {
                        let mut offset = 0u32;
                        for f in fields {
                            let fa = self.align_of(f.ty, pointer_size)?;
                            offset = round_up(offset, fa);
                            offset += self.size_of(f.ty, pointer_size)?;
                        }
                        offset
                    }
                };
                Some(round_up(raw, align))
            }
            TypeKind::Aggregate { complete: false, .. } => None,
            TypeKind::Enum { complete: true, .. } => Some(4),
            TypeKind::Enum { complete: false, .. } => None,
            TypeKind::Placeholder => None,
        }
    }

    pub fn align_of(&self, id: TypeId, pointer_size: u32) -> Option<u32> {
        match &self.get(id).kind {
            TypeKind::Aggregate { fields, complete: true, .. } => fields
                .iter()
                .map(|f| self.align_of(f.ty, pointer_size))
                .collect::<Option<Vec<_>>>()
                .map(|aligns| aligns.into_iter().max().unwrap_or(1)),
            TypeKind::Aggregate { complete: false, .. } => None,
            _ => self.size_of(id, pointer_size),
        }
    }
}

fn round_up(value: u32, align: u32) -> u32 {
    if align == 0 {
        return value;
    }
    (value + align - 1) / align * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_identical_basic_types() {
        let mut arena = TypeArena::new();
        let a = arena.int(IntKind::Int, Signedness::Signed, Qualifiers::empty());
        let b = arena.int(IntKind::Int, Signedness::Signed, Qualifiers::empty());
        assert_eq!(a, b);
    }

    #[test]
    fn const_qualified_int_is_distinct() {
        let mut arena = TypeArena::new();
        let plain = arena.int(IntKind::Int, Signedness::Signed, Qualifiers::empty());
        let constant = arena.int(IntKind::Int, Signedness::Signed, Qualifiers::CONST);
        assert_ne!(plain, constant);
    }

    #[test]
    fn forward_declared_aggregate_completes_in_place() {
        let mut arena = TypeArena::new();
        let int_ty = arena.int(IntKind::Int, Signedness::Signed, Qualifiers::empty());
        let id = arena.declare_aggregate(AggKind::Struct, Some("point".to_string()));
        assert!(!arena.is_complete(id));
        arena.complete_aggregate(
            id,
            vec![
                FieldDecl { name: "x".to_string(), ty: int_ty, bitfield_width: None },
                FieldDecl { name: "y".to_string(), ty: int_ty, bitfield_width: None },
            ],
        );
        assert!(arena.is_complete(id));
        assert_eq!(arena.size_of(id, 8), Some(8));
    }

    #[test]
    fn pointer_size_follows_target_width() {
        let mut arena = TypeArena::new();
        let int_ty = arena.int(IntKind::Int, Signedness::Signed, Qualifiers::empty());
        let ptr = arena.pointer(int_ty, Qualifiers::empty());
        assert_eq!(arena.size_of(ptr, 4), Some(4));
        assert_eq!(arena.size_of(ptr, 8), Some(8));
    }
}
