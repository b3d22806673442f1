//! Fishbone Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Fishbone diagram
//! engine. It includes:
//!
//! - **Geometry**: Points, sizes, rectangles and line segments ([`geometry`] module)
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Strokes**: Line style definitions for bones, ribs and outlines ([`stroke`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod stroke;
