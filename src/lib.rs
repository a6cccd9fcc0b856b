//! Form enhancement controller.
//!
//! A [`form::FormController`] binds to a [`form::FormSurface`], cleans and validates
//! its fields, drives error display through a [`form::DisplayLayer`] and hands the
//! cleaned values to an async submit handler, one submission at a time.

pub mod feedback;
pub mod form;
pub mod id;
pub mod prelude;
