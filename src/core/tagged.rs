//! Closed-set variant handles.
//!
//! A tagged union is an enum over a fixed list of concrete types. Method calls are forwarded
//! by an exhaustive match (generated by `enum_dispatch` on the enums themselves), so there is
//! no vtable and a handle stays a plain `Copy` value that can be stored in bulk and sent to any
//! worker.

use std::fmt;

/// An enum over a closed set of concrete types, each with a fixed non-zero tag.
///
/// Tag `0` is reserved for the empty [`Handle`].
pub trait TaggedUnion: Sized {
    const TYPE_NAME: &'static str;

    /// Variant names indexed by tag, `TAG_NAMES[0]` names the empty handle.
    const TAG_NAMES: &'static [&'static str];

    fn tag(&self) -> u8;

    fn tag_name(&self) -> &'static str {
        Self::TAG_NAMES[self.tag() as usize]
    }

    fn is<T: Variant<Self>>(&self) -> bool {
        self.tag() == T::TAG
    }

    fn cast<T: Variant<Self>>(&self) -> Option<&T> {
        T::cast(self)
    }

    fn cast_mut<T: Variant<Self>>(&mut self) -> Option<&mut T> {
        T::cast_mut(self)
    }

    fn downcast<T: Variant<Self>>(&self) -> anyhow::Result<&T> {
        match T::cast(self) {
            Some(value) => Ok(value),
            None => anyhow::bail!(
                "type mismatch - {} holds '{}', not '{}'",
                Self::TYPE_NAME,
                self.tag_name(),
                Self::TAG_NAMES[T::TAG as usize]
            ),
        }
    }
}

/// A concrete type that is one member of the tagged union `U`.
pub trait Variant<U: TaggedUnion>: Sized {
    const TAG: u8;

    fn cast(union: &U) -> Option<&Self>;

    fn cast_mut(union: &mut U) -> Option<&mut Self>;
}

/// Implements [`TaggedUnion`] for an enum whose variants are named after their payload types,
/// the shape `enum_dispatch` generates. Variants are listed in declaration order and tags count
/// up from 1 by position.
#[macro_export]
macro_rules! tagged_union {
    ( @variants $union:ident, $tag:expr, ) => {};
    ( @variants $union:ident, $tag:expr, $variant:ident, $( $rest:ident, )* ) => {
        impl $crate::core::tagged::Variant<$union> for $variant {
            const TAG: u8 = $tag;

            #[inline]
            fn cast(union: &$union) -> Option<&Self> {
                match union {
                    $union::$variant(value) => Some(value),
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }

            #[inline]
            fn cast_mut(union: &mut $union) -> Option<&mut Self> {
                match union {
                    $union::$variant(value) => Some(value),
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }
        }

        $crate::tagged_union!(@variants $union, $tag + 1, $( $rest, )*);
    };
    ( $union:ident { $( $variant:ident ),+ $(,)? } ) => {
        impl $crate::core::tagged::TaggedUnion for $union {
            const TYPE_NAME: &'static str = stringify!($union);
            const TAG_NAMES: &'static [&'static str] = &["<empty>", $( stringify!($variant) ),+];

            #[inline]
            fn tag(&self) -> u8 {
                match self {
                    $(
                        $union::$variant(_) => {
                            <$variant as $crate::core::tagged::Variant<$union>>::TAG
                        }
                    )+
                }
            }
        }

        $crate::tagged_union!(@variants $union, 1, $( $variant, )+);
    };
}

/// Non-owning reference to a value of the tagged union `U`, or nothing.
///
/// Copying a handle copies the reference only. The pointee lives in the [`Arena`] that
/// allocated it. Any method call on an empty handle panics.
pub struct Handle<'a, U> {
    ptr: Option<&'a U>,
}

impl<'a, U: TaggedUnion> Handle<'a, U> {
    pub fn empty() -> Self {
        Self { ptr: None }
    }

    pub fn new(value: &'a U) -> Self {
        Self { ptr: Some(value) }
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    pub fn tag(&self) -> u8 {
        self.ptr.map_or(0, |value| value.tag())
    }

    pub fn tag_name(&self) -> &'static str {
        U::TAG_NAMES[self.tag() as usize]
    }

    pub fn is<T: Variant<U>>(&self) -> bool {
        self.tag() == T::TAG
    }

    pub fn cast<T: Variant<U>>(&self) -> Option<&'a T> {
        self.ptr.and_then(T::cast)
    }

    pub fn downcast<T: Variant<U>>(&self) -> anyhow::Result<&'a T> {
        match self.ptr {
            Some(value) => value.downcast::<T>(),
            None => anyhow::bail!(
                "type mismatch - {} handle is empty, not '{}'",
                U::TYPE_NAME,
                U::TAG_NAMES[T::TAG as usize]
            ),
        }
    }

    /// The referenced value. Panics if the handle is empty.
    #[inline]
    #[track_caller]
    pub fn get(&self) -> &'a U {
        match self.ptr {
            Some(value) => value,
            None => empty_handle::<U>(),
        }
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self.ptr, other.ptr) {
            (Some(a), Some(b)) => std::ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn empty_handle<U: TaggedUnion>() -> ! {
    panic!("method called on an empty {} handle", U::TYPE_NAME)
}

impl<U> Clone for Handle<'_, U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Handle<'_, U> {}

impl<U: TaggedUnion> Default for Handle<'_, U> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<U: TaggedUnion> PartialEq for Handle<'_, U> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<U: TaggedUnion> fmt::Debug for Handle<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(value) => write!(f, "{}::{}@{:p}", U::TYPE_NAME, self.tag_name(), value),
            None => write!(f, "{}::<empty>", U::TYPE_NAME),
        }
    }
}

impl<U: TaggedUnion + fmt::Display> fmt::Display for Handle<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(value) => value.fmt(f),
            None => write!(f, "{}::<empty>", U::TYPE_NAME),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArenaIndex(u32);

impl ArenaIndex {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owns every value of one tagged union for the lifetime of a scene.
///
/// Values are added through `&mut self` while the scene is built; handles borrow the arena
/// afterwards, so no value can be added while any handle is alive.
#[derive(Debug)]
pub struct Arena<U> {
    items: Vec<U>,
}

impl<U: TaggedUnion> Arena<U> {
    pub fn new() -> Self {
        Self { items: vec![] }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn alloc<T: Into<U>>(&mut self, value: T) -> ArenaIndex {
        let index = ArenaIndex(self.items.len() as u32);
        self.items.push(value.into());
        index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Handle to the value at `index`, or an empty handle if the index is not from this arena.
    pub fn handle(&self, index: ArenaIndex) -> Handle<'_, U> {
        self.items
            .get(index.index())
            .map_or_else(Handle::empty, Handle::new)
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle<'_, U>> + '_ {
        self.items.iter().map(Handle::new)
    }
}

impl<U: TaggedUnion> Default for Arena<U> {
    fn default() -> Self {
        Self::new()
    }
}
