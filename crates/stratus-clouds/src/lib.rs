pub mod archetype;
pub mod depth;
pub mod noise;
pub mod reshade;
pub mod shading;
pub mod shape;
pub mod worker;

pub use depth::{partition_depth_layers, sample_vertical, DepthLayerMap};
pub use noise::NoiseField;
pub use reshade::{recompute_colors, recompute_colors_and_shadows, ReshadeOutput};
pub use shading::{map_color, ShadeInput};
pub use shape::{
    create_fragment_spec, fragment_spec, generate_full_cloud_data, synthesize_pixels,
    synthesize_with_stats, CloudData, FragmentRequest, GridLayout, SynthesisSettings,
    SynthesisStats,
};
pub use worker::{
    handle_request, CloudWorker, Completion, InlineWorker, ThreadWorker, Ticket, WorkerRequest,
    WorkerResponse,
};
