mod authoring_flow;
mod engine_flow;
