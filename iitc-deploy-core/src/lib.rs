#![doc = "iitc-deploy-core: core logic library for iitc-deploy."]

//! This crate contains the build-tree model, index page generation and the
//! publishing pipeline for an IITC userscript build. The concrete storage
//! client lives in the CLI crate; everything here talks to storage through
//! the [`contract::ObjectStore`] trait.
//!
//! # Usage
//! Build a [`tree::PathTree`] with [`builder::build_tree`], turn it into pages
//! with [`index::build_index_documents`] and push both with
//! [`publish::publish`]. [`site`] wires the three together.

pub mod builder;
pub mod content_type;
pub mod contract;
pub mod html;
pub mod index;
pub mod meta;
pub mod publish;
pub mod site;
pub mod tree;
pub mod variants;
pub mod workdir;
