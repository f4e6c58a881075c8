/// Core value types for evaluation.
///
/// Declares the tagged [`core::Value`] sum type, the shared [`core::Slot`]
/// binding handle, and the conversion, equality, and truthiness rules used
/// throughout the interpreter.
///
/// # Responsibilities
/// - Defines the `Value` enum and all supported variants.
/// - Implements numeric coercion, canonical number formatting, loose and
///   strict equality, and truthiness.
/// - Provides the shared slot type that makes assignment observable through
///   aliases.
pub mod core;
/// Host object capability interface.
///
/// Contains the [`object::HostObject`] trait through which the embedding
/// host exposes named properties and callable methods, plus a fixed
/// property-table implementation for hosts that do not need a dynamic hook.
pub mod object;
/// Iterator protocol for `for` loops.
///
/// Defines the [`iter::ValueIter`] trait and the concrete iterators over
/// strings, arrays, and dicts. Host objects can supply their own iterator
/// through [`object::HostObject::make_iter`].
pub mod iter;
