// Copyright (c) 2024-2025, Decisym, LLC

pub mod builder;
pub mod controller;
pub mod error;
pub mod mapping;
pub mod projection;
pub mod rdf_reader;
pub mod status;
pub mod template;
pub mod vocab;
pub mod writer;
