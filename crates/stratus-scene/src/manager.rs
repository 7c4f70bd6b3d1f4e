//! Cloud fragment lifecycle: spawning through the worker, per-frame drift,
//! recycling, batched lighting refreshes and redraw tracking.

use std::collections::{HashMap, VecDeque};

use stratus_clouds::depth::{partition_depth_layers, DepthLayerMap};
use stratus_clouds::shape::{FragmentRequest, SynthesisSettings};
use stratus_clouds::worker::{CloudWorker, Completion, Ticket, WorkerRequest, WorkerResponse};
use stratus_core::config::{CloudConfig, LayerConfig, StratusConfig};
use stratus_core::constants::LIGHT_DIRECTION_TOLERANCE;
use stratus_core::rng::HashRng;
use stratus_core::types::{LayerId, LightingDescriptor};

use crate::batch::BatchScheduler;
use crate::fragment::{CloudFragment, FragmentId, FragmentState};
use crate::fragment_map::FragmentMap;
use crate::raster::RasterTarget;
use crate::spawn::{initial_placements, layer_target, replacement_x, Placement};

/// How a new descriptor differs from the one a fragment was colored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingChange {
    Unchanged,
    /// Palette moved; stored shadows still hold.
    Colors,
    /// Light direction moved past the tolerance.
    Shadows,
}

pub fn classify_lighting_change(
    previous: Option<&LightingDescriptor>,
    next: &LightingDescriptor,
) -> LightingChange {
    match previous {
        None => LightingChange::Shadows,
        Some(prev) if prev == next => LightingChange::Unchanged,
        Some(prev) => {
            let moved = prev.light_direction.distance(next.light_direction);
            if moved > LIGHT_DIRECTION_TOLERANCE {
                LightingChange::Shadows
            } else {
                LightingChange::Colors
            }
        }
    }
}

/// Outcome of a settings update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChange {
    Unchanged,
    /// Live fragments were adjusted in place.
    Adjusted,
    /// Everything was destroyed and respawned.
    Respawned,
}

#[derive(Debug, Clone)]
enum PendingJob {
    Spawn {
        id: FragmentId,
        descriptor: Option<LightingDescriptor>,
    },
    Reshade {
        id: FragmentId,
        descriptor: LightingDescriptor,
    },
}

/// Running totals since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    pub spawned: u64,
    pub spawn_failed: u64,
    pub recycled: u64,
    pub reshades_submitted: u64,
    /// Re-shade requests dropped because one was already in flight.
    pub reshades_dropped: u64,
    /// Completions discarded because their fragment was gone.
    pub stale_completions: u64,
    pub redraws: u64,
}

/// What one `update` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub completed: usize,
    pub submitted: usize,
    pub recycled: usize,
    pub redrawn: usize,
}

/// One entry of the back-to-front draw list.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub id: FragmentId,
    /// Top-left of the raster target in screen pixels.
    pub x: f32,
    pub y: f32,
    pub depth: f32,
    pub alpha: f32,
    pub raster: &'a RasterTarget,
}

pub struct CloudManager {
    clouds: CloudConfig,
    layer_config: LayerConfig,
    layers: DepthLayerMap,
    fragments: FragmentMap,
    worker: Box<dyn CloudWorker>,
    scheduler: BatchScheduler,
    spawn_queue: VecDeque<(FragmentId, Placement)>,
    reshade_queue: VecDeque<FragmentId>,
    pending: HashMap<Ticket, PendingJob>,
    next_ticket: u64,
    rng: HashRng,
    screen_width: f32,
    screen_height: f32,
    descriptor: Option<LightingDescriptor>,
    stats: ManagerStats,
}

impl CloudManager {
    pub fn new(
        config: &StratusConfig,
        worker: Box<dyn CloudWorker>,
        screen_width: f32,
        screen_height: f32,
        seed: u32,
    ) -> Self {
        let layers = partition_depth_layers(config.clouds.layer_count, &config.layers);
        Self {
            clouds: config.clouds.clone(),
            layer_config: config.layers.clone(),
            layers,
            fragments: FragmentMap::new(),
            worker,
            scheduler: BatchScheduler::from_config(&config.worker),
            spawn_queue: VecDeque::new(),
            reshade_queue: VecDeque::new(),
            pending: HashMap::new(),
            next_ticket: 0,
            rng: HashRng::new(seed),
            screen_width,
            screen_height,
            descriptor: None,
            stats: ManagerStats::default(),
        }
    }

    /// Queue the initial population for every layer.
    pub fn populate(&mut self) -> usize {
        let placements =
            initial_placements(&self.layers, &self.clouds, self.screen_width, &mut self.rng);
        let queued = placements
            .into_iter()
            .filter_map(|p| self.spawn_at(p.layer, p.spawn_x))
            .count();
        log::info!(
            "Queued {} cloud fragments across {} layers",
            queued,
            self.layers.len()
        );
        queued
    }

    /// Spawn a fragment entering from the right edge of `layer`.
    pub fn spawn(&mut self, layer: LayerId) -> Option<FragmentId> {
        let x = replacement_x(self.screen_width, self.clouds.offscreen_margin, &mut self.rng);
        self.spawn_at(layer, x)
    }

    /// Spawn a fragment in `layer` centered at `spawn_x`. `None` when the
    /// layer does not exist.
    pub fn spawn_at(&mut self, layer: LayerId, spawn_x: f32) -> Option<FragmentId> {
        if !self.layers.contains_key(&layer) {
            log::warn!("No depth layer {} configured; spawn abandoned", layer.0);
            return None;
        }
        let id = self.fragments.insert_spawning(layer);
        self.spawn_queue
            .push_back((id, Placement { layer, spawn_x }));
        Some(id)
    }

    /// Explicitly destroy a fragment. Safe at any time, including while a
    /// worker request for it is in flight; repeated calls return false.
    pub fn destroy(&mut self, id: FragmentId) -> bool {
        self.fragments.get_mut(id).is_some_and(|f| f.destroy())
    }

    /// Advance one frame of `dt` scene seconds.
    pub fn update(&mut self, dt: f32) -> FrameReport {
        let completed = self.process_completions();
        let recycled = self.advance_fragments(dt);
        self.fill_deficits();
        self.scheduler.tick(dt);
        let submitted = self.submit_batch();
        let redrawn = self.redraw();
        FrameReport {
            completed,
            submitted,
            recycled,
            redrawn,
        }
    }

    /// Install a new lighting descriptor and queue re-shading of live
    /// fragments when it differs from the current one.
    pub fn set_lighting(&mut self, descriptor: LightingDescriptor) -> LightingChange {
        let change = classify_lighting_change(self.descriptor.as_ref(), &descriptor);
        if change == LightingChange::Unchanged {
            return change;
        }
        self.descriptor = Some(descriptor);

        let mut queued = 0;
        for fragment in self.fragments.iter() {
            if !fragment.is_live() {
                continue;
            }
            if fragment.reshade_in_flight() {
                // Picked up by the next refresh instead.
                self.stats.reshades_dropped += 1;
                continue;
            }
            if !self.reshade_queue.contains(&fragment.id) {
                self.reshade_queue.push_back(fragment.id);
                queued += 1;
            }
        }
        log::debug!("Lighting change {:?}: {} fragments queued", change, queued);
        change
    }

    /// Apply new cloud/layer settings. Speed and size adjust live fragments;
    /// a layer change respawns everything.
    pub fn apply_settings(&mut self, clouds: &CloudConfig, layers: &LayerConfig) -> SettingsChange {
        if clouds.layer_count != self.clouds.layer_count || *layers != self.layer_config {
            self.clouds = clouds.clone();
            self.layer_config = layers.clone();
            self.respawn_all();
            return SettingsChange::Respawned;
        }
        if *clouds == self.clouds {
            return SettingsChange::Unchanged;
        }

        let old_speed = self.clouds.base_speed;
        let old_size = self.clouds.size_multiplier;
        for fragment in self.fragments.iter_mut() {
            let Some(spec) = fragment.spec() else {
                continue;
            };
            if clouds.base_speed != old_speed {
                let speed = if old_speed > 0.0 {
                    spec.speed * clouds.base_speed / old_speed
                } else {
                    clouds.base_speed * spec.speed_multiplier
                };
                fragment.set_speed(speed);
            }
            if clouds.size_multiplier != old_size && old_size > 0.0 {
                fragment.rescale(clouds.size_multiplier / old_size);
            }
        }
        self.clouds = clouds.clone();
        SettingsChange::Adjusted
    }

    /// Destroy all fragments, rebuild layers and queue a fresh population.
    pub fn respawn_all(&mut self) -> usize {
        self.fragments.clear();
        self.spawn_queue.clear();
        self.reshade_queue.clear();
        self.layers = partition_depth_layers(self.clouds.layer_count, &self.layer_config);
        self.populate()
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;
    }

    /// Live fragments ordered back to front.
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut items: Vec<DrawItem<'_>> = self
            .fragments
            .iter()
            .filter(|f| f.is_live())
            .filter_map(|f| {
                let spec = f.spec()?;
                let raster = f.raster()?;
                Some(DrawItem {
                    id: f.id,
                    x: spec.x - spec.width * 0.5,
                    y: spec.y - spec.height * 0.5,
                    depth: spec.depth,
                    alpha: spec.alpha,
                    raster,
                })
            })
            .collect();
        items.sort_by(|a, b| a.depth.total_cmp(&b.depth).then(a.id.cmp(&b.id)));
        items
    }

    pub fn layers(&self) -> &DepthLayerMap {
        &self.layers
    }

    pub fn fragments(&self) -> &FragmentMap {
        &self.fragments
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&CloudFragment> {
        self.fragments.get(id)
    }

    pub fn descriptor(&self) -> Option<&LightingDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn stats(&self) -> ManagerStats {
        self.stats
    }

    /// Requests handed to the worker and not yet completed.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Work waiting for a batch slot: (spawns, re-shades).
    pub fn queued(&self) -> (usize, usize) {
        (self.spawn_queue.len(), self.reshade_queue.len())
    }

    pub fn settings(&self) -> &CloudConfig {
        &self.clouds
    }

    fn next_ticket(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    fn process_completions(&mut self) -> usize {
        let completions = self.worker.poll();
        let count = completions.len();
        for Completion { ticket, response } in completions {
            match self.pending.remove(&ticket) {
                Some(PendingJob::Spawn { id, descriptor }) => {
                    self.finish_spawn(id, descriptor, response)
                }
                Some(PendingJob::Reshade { id, descriptor }) => {
                    self.finish_reshade(id, ticket, descriptor, response)
                }
                None => log::warn!("Completion for unknown ticket {}", ticket.0),
            }
        }
        count
    }

    fn finish_spawn(
        &mut self,
        id: FragmentId,
        descriptor: Option<LightingDescriptor>,
        response: WorkerResponse,
    ) {
        let Some(fragment) = self.fragments.get_mut(id) else {
            self.stats.stale_completions += 1;
            return;
        };
        if fragment.state != FragmentState::Spawning {
            self.stats.stale_completions += 1;
            return;
        }

        let data = match response {
            WorkerResponse::Cloud(data) if !data.pixels.is_empty() => data,
            WorkerResponse::Cloud(_) => {
                log::warn!("Fragment {} synthesized no cells; dropped", id.0);
                self.fragments.remove(id);
                self.stats.spawn_failed += 1;
                return;
            }
            other => {
                log::warn!(
                    "Fragment {} expected cloud data, got {}",
                    id.0,
                    response_kind(&other)
                );
                self.fragments.remove(id);
                self.stats.spawn_failed += 1;
                return;
            }
        };

        let stale_lighting = match (&self.descriptor, &descriptor) {
            (Some(current), used) => used.as_ref() != Some(current),
            (None, _) => false,
        };
        fragment.activate(data, descriptor);
        self.stats.spawned += 1;
        if stale_lighting {
            self.reshade_queue.push_back(id);
        }
    }

    fn finish_reshade(
        &mut self,
        id: FragmentId,
        ticket: Ticket,
        descriptor: LightingDescriptor,
        response: WorkerResponse,
    ) {
        let Some(fragment) = self.fragments.get_mut(id) else {
            self.stats.stale_completions += 1;
            return;
        };
        fragment.finish_reshade(ticket);
        if !fragment.is_live() {
            self.stats.stale_completions += 1;
            return;
        }
        match response {
            WorkerResponse::Colors(colors) => fragment.apply_colors(&colors, descriptor),
            WorkerResponse::ColorsAndShadows(output) => fragment.apply_reshade(output, descriptor),
            other => log::warn!(
                "Fragment {} expected re-shade output, got {}",
                id.0,
                response_kind(&other)
            ),
        }

        // A refresh dropped while this job was in flight is not repeated by
        // the scene, so catch up to the current descriptor here.
        if fragment.lit_by() != self.descriptor.as_ref() && !self.reshade_queue.contains(&id) {
            self.reshade_queue.push_back(id);
        }
    }

    /// Drift every active fragment and recycle the ones past the margin.
    fn advance_fragments(&mut self, dt: f32) -> usize {
        let margin = self.clouds.offscreen_margin;
        let mut drifted = Vec::new();
        let mut destroyed = Vec::new();
        for fragment in self.fragments.iter_mut() {
            if fragment.advance(dt, margin) {
                drifted.push((fragment.id, fragment.layer));
            } else if fragment.state == FragmentState::Recycled {
                destroyed.push(fragment.id);
            }
        }

        for id in destroyed {
            self.fragments.remove(id);
        }
        let recycled = drifted.len();
        for (id, layer) in drifted {
            self.fragments.remove(id);
            self.stats.recycled += 1;
            self.spawn(layer);
        }
        recycled
    }

    /// Top up layers that fell below their target population.
    fn fill_deficits(&mut self) {
        let targets: Vec<(LayerId, usize)> = self
            .layers
            .iter()
            .map(|(&id, layer)| (id, layer_target(self.clouds.cloud_count, layer.depth)))
            .collect();
        for (layer, target) in targets {
            let population = self.fragments.population(layer);
            for _ in population..target {
                self.spawn(layer);
            }
        }
    }

    fn submit_batch(&mut self) -> usize {
        let mut budget = self.scheduler.capacity(self.worker.in_flight());
        let mut submitted = 0;
        while budget > 0 {
            let sent = if let Some((id, placement)) = self.spawn_queue.pop_front() {
                self.submit_spawn(id, placement)
            } else if let Some(id) = self.reshade_queue.pop_front() {
                self.submit_reshade(id)
            } else {
                break;
            };
            if sent {
                submitted += 1;
                budget -= 1;
            }
        }
        self.scheduler.record_batch(submitted);
        submitted
    }

    fn submit_spawn(&mut self, id: FragmentId, placement: Placement) -> bool {
        if self.fragments.get(id).map(|f| f.state) != Some(FragmentState::Spawning) {
            return false;
        }
        let Some(layer) = self.layers.get(&placement.layer).cloned() else {
            log::warn!(
                "Depth layer {} disappeared before spawn; fragment {} dropped",
                placement.layer.0,
                id.0
            );
            self.fragments.remove(id);
            return false;
        };

        let request = FragmentRequest {
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            layer: Some((placement.layer, layer)),
            spawn_x: Some(placement.spawn_x),
            seed: self.rng.next_u32(),
            settings: SynthesisSettings::from(&self.clouds),
        };
        let descriptor = self.descriptor.clone();
        let ticket = self.next_ticket();
        let job = WorkerRequest::GenerateCloud {
            request,
            descriptor: descriptor.clone(),
        };
        if let Err(e) = self.worker.submit(ticket, job) {
            log::error!("Spawn request for fragment {} failed: {}", id.0, e);
            self.fragments.remove(id);
            self.stats.spawn_failed += 1;
            return false;
        }
        self.pending
            .insert(ticket, PendingJob::Spawn { id, descriptor });
        true
    }

    fn submit_reshade(&mut self, id: FragmentId) -> bool {
        let Some(descriptor) = self.descriptor.clone() else {
            return false;
        };
        let ticket = Ticket(self.next_ticket);
        let Some(fragment) = self.fragments.get_mut(id) else {
            return false;
        };
        if !fragment.is_live() {
            return false;
        }
        let change = classify_lighting_change(fragment.lit_by(), &descriptor);
        if change == LightingChange::Unchanged {
            return false;
        }
        if !fragment.try_begin_reshade(ticket) {
            self.stats.reshades_dropped += 1;
            return false;
        }

        let pixels = fragment.pixels().to_vec();
        let job = match (change, fragment.spec()) {
            (LightingChange::Shadows, Some(spec)) => WorkerRequest::RecomputeColorsAndShadows {
                pixels,
                descriptor: Some(descriptor.clone()),
                spec: spec.clone(),
            },
            _ => WorkerRequest::RecomputeColors {
                pixels,
                descriptor: Some(descriptor.clone()),
            },
        };
        if let Err(e) = self.worker.submit(ticket, job) {
            log::error!("Re-shade request for fragment {} failed: {}", id.0, e);
            fragment.end_reshade();
            return false;
        }
        self.next_ticket += 1;
        self.stats.reshades_submitted += 1;
        self.pending
            .insert(ticket, PendingJob::Reshade { id, descriptor });
        true
    }

    fn redraw(&mut self) -> usize {
        let redrawn = self
            .fragments
            .iter_mut()
            .map(|f| f.redraw_if_needed())
            .filter(|&drawn| drawn)
            .count();
        self.stats.redraws += redrawn as u64;
        redrawn
    }
}

fn response_kind(response: &WorkerResponse) -> &'static str {
    match response {
        WorkerResponse::Cloud(_) => "cloud data",
        WorkerResponse::Colors(_) => "colors",
        WorkerResponse::ColorsAndShadows(_) => "colors and shadows",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;
    use stratus_clouds::worker::{handle_request, InlineWorker};
    use stratus_core::config::WorkerConfig;
    use stratus_core::error::WorkerError;
    use stratus_core::types::{GradientKind, Rgb};

    /// Holds requests until the test releases them.
    #[derive(Default)]
    struct HeldQueue {
        held: Vec<(Ticket, WorkerRequest)>,
        ready: Vec<Completion>,
    }

    #[derive(Clone, Default)]
    struct ManualWorker(Rc<RefCell<HeldQueue>>);

    impl ManualWorker {
        fn release_all(&self) {
            let mut q = self.0.borrow_mut();
            let held: Vec<_> = q.held.drain(..).collect();
            for (ticket, request) in held {
                let response = handle_request(request);
                q.ready.push(Completion { ticket, response });
            }
        }

        fn held(&self) -> usize {
            self.0.borrow().held.len()
        }
    }

    impl CloudWorker for ManualWorker {
        fn submit(&mut self, ticket: Ticket, request: WorkerRequest) -> Result<(), WorkerError> {
            self.0.borrow_mut().held.push((ticket, request));
            Ok(())
        }

        fn poll(&mut self) -> Vec<Completion> {
            self.0.borrow_mut().ready.drain(..).collect()
        }

        fn in_flight(&self) -> usize {
            let q = self.0.borrow();
            q.held.len() + q.ready.len()
        }
    }

    fn config(cloud_count: u32, layer_count: u32) -> StratusConfig {
        let mut config = StratusConfig::default();
        config.clouds.cloud_count = cloud_count;
        config.clouds.layer_count = layer_count;
        config.clouds.base_width = stratus_core::types::ValueRange::new(120.0, 200.0);
        config.worker = WorkerConfig {
            threads: 1,
            batch_size: 64,
            max_in_flight: 64,
            batch_interval_secs: 0.0,
        };
        config
    }

    fn descriptor(direction: Vec2, base: Rgb) -> LightingDescriptor {
        LightingDescriptor {
            gradient_colors: vec![Rgb::new(70, 130, 220), Rgb::new(160, 205, 245)],
            sun_color: Rgb::WHITE,
            cloud_base_color: base,
            cloud_highlight_color: Rgb::WHITE,
            cloud_shadow_color: Rgb::new(120, 130, 160),
            sun_viewport_position: Vec2::new(0.5, -1.5),
            light_direction: direction,
            gradient_kind: GradientKind::Radial,
            radial_center: Some(Vec2::new(0.5, -1.5)),
            radial_radius: Some(3000.0),
        }
    }

    fn inline_manager(cloud_count: u32, layer_count: u32) -> CloudManager {
        CloudManager::new(
            &config(cloud_count, layer_count),
            Box::new(InlineWorker::new()),
            1280.0,
            720.0,
            7,
        )
    }

    fn live_count(m: &CloudManager) -> usize {
        m.fragments().iter().filter(|f| f.is_live()).count()
    }

    #[test]
    fn test_populate_reaches_layer_targets() {
        let mut m = inline_manager(6, 3);
        let queued = m.populate();
        let expected: usize = m
            .layers()
            .values()
            .map(|l| layer_target(6, l.depth))
            .sum();
        assert_eq!(queued, expected);

        m.update(0.0); // submit
        m.update(0.0); // complete
        assert_eq!(live_count(&m), expected);
        assert_eq!(m.stats().spawned as usize, expected);
        for (&id, layer) in m.layers() {
            assert_eq!(m.fragments().population(id), layer_target(6, layer.depth));
        }
    }

    #[test]
    fn test_spawn_missing_layer_returns_none() {
        let mut m = inline_manager(4, 2);
        assert!(m.spawn(LayerId(99)).is_none());
        assert!(m.spawn(LayerId(1)).is_some());
    }

    #[test]
    fn test_drift_and_recycle_same_layer() {
        let mut m = inline_manager(2, 1);
        m.populate();
        m.update(0.0);
        m.update(0.0);
        let before = live_count(&m);
        assert!(before > 0);

        // Long enough for every fragment to leave the screen.
        let report = m.update(1000.0);
        assert!(report.recycled > 0);
        assert_eq!(m.stats().recycled as usize, report.recycled);
        for f in m.fragments().iter() {
            assert_eq!(f.layer, LayerId(0));
        }
        m.update(0.0);
        assert_eq!(m.fragments().population(LayerId(0)), layer_target(2, 1.0));
    }

    #[test]
    fn test_per_frame_drift_subtracts_speed() {
        let mut m = inline_manager(1, 1);
        m.populate();
        m.update(0.0);
        m.update(0.0);
        let id = m.fragments().ids()[0];
        let (x0, speed) = {
            let spec = m.fragment(id).unwrap().spec().unwrap();
            (spec.x, spec.speed)
        };
        m.update(0.5);
        let x1 = m.fragment(id).unwrap().spec().unwrap().x;
        assert!((x0 - speed * 0.5 - x1).abs() < 1e-3);
    }

    #[test]
    fn test_lighting_refresh_paths() {
        let mut m = inline_manager(3, 1);
        m.populate();
        m.update(0.0);
        m.update(0.0);

        let noon = descriptor(Vec2::new(0.0, 1.0), Rgb::new(240, 240, 245));
        assert_eq!(m.set_lighting(noon.clone()), LightingChange::Shadows);
        assert_eq!(m.set_lighting(noon.clone()), LightingChange::Unchanged);
        m.update(0.0);
        m.update(0.0);
        for f in m.fragments().iter().filter(|f| f.is_live()) {
            assert_eq!(f.lit_by(), Some(&noon));
        }

        let warmer = descriptor(Vec2::new(0.0, 1.0), Rgb::new(250, 220, 200));
        assert_eq!(m.set_lighting(warmer.clone()), LightingChange::Colors);
        let shifted = descriptor(Vec2::new(0.8, 0.6), Rgb::new(250, 220, 200));
        assert_eq!(
            classify_lighting_change(Some(&warmer), &shifted),
            LightingChange::Shadows
        );
    }

    #[test]
    fn test_redraw_only_when_colors_change() {
        let mut m = inline_manager(2, 1);
        m.populate();
        m.update(0.0);
        let report = m.update(0.0);
        assert!(report.redrawn > 0, "new fragments are drawn once");
        assert_eq!(m.update(0.0).redrawn, 0, "nothing changed");

        m.set_lighting(descriptor(Vec2::new(0.0, 1.0), Rgb::new(230, 200, 180)));
        m.update(0.0);
        let report = m.update(0.0);
        assert!(report.redrawn > 0);
        assert_eq!(m.update(0.0).redrawn, 0);
    }

    #[test]
    fn test_busy_guard_drops_second_refresh() {
        let worker = ManualWorker::default();
        let mut m = CloudManager::new(&config(1, 1), Box::new(worker.clone()), 1280.0, 720.0, 3);
        m.populate();
        m.update(0.0);
        worker.release_all();
        m.update(0.0);
        assert_eq!(live_count(&m), 1);

        m.set_lighting(descriptor(Vec2::new(0.0, 1.0), Rgb::WHITE));
        m.update(0.0);
        assert_eq!(worker.held(), 1, "one re-shade in flight");

        m.set_lighting(descriptor(Vec2::new(1.0, 0.0), Rgb::WHITE));
        m.update(0.0);
        assert_eq!(worker.held(), 1, "second request dropped, not queued");
        assert_eq!(m.stats().reshades_dropped, 1);
    }

    #[test]
    fn test_dropped_refresh_catches_up_after_in_flight_job() {
        let worker = ManualWorker::default();
        let mut m = CloudManager::new(&config(1, 1), Box::new(worker.clone()), 1280.0, 720.0, 3);
        m.populate();
        m.update(0.0);
        worker.release_all();
        m.update(0.0);
        let id = m.fragments().ids()[0];

        let first = descriptor(Vec2::new(0.0, 1.0), Rgb::WHITE);
        let latest = descriptor(Vec2::new(1.0, 0.0), Rgb::new(240, 190, 160));
        m.set_lighting(first.clone());
        m.update(0.0);
        m.set_lighting(latest.clone());
        m.update(0.0);
        assert_eq!(m.stats().reshades_dropped, 1);

        // The older job lands; the fragment is re-queued for the newer lighting.
        worker.release_all();
        m.update(0.0);
        assert_eq!(m.fragment(id).unwrap().lit_by(), Some(&first));
        assert_eq!(worker.held(), 1, "catch-up re-shade submitted");

        // Repeating the unchanged descriptor queues nothing new.
        assert_eq!(m.set_lighting(latest.clone()), LightingChange::Unchanged);
        worker.release_all();
        m.update(0.0);
        assert_eq!(m.fragment(id).unwrap().lit_by(), Some(&latest));
        assert_eq!(m.descriptor(), Some(&latest));

        m.update(0.0);
        assert_eq!(worker.held(), 0, "no further work once current");
    }

    #[test]
    fn test_destroy_mid_flight_discards_result() {
        let worker = ManualWorker::default();
        let mut m = CloudManager::new(&config(1, 1), Box::new(worker.clone()), 1280.0, 720.0, 5);
        m.populate();
        m.update(0.0);
        worker.release_all();
        m.update(0.0);
        let id = m.fragments().ids()[0];

        m.set_lighting(descriptor(Vec2::new(0.0, 1.0), Rgb::WHITE));
        m.update(0.0);
        assert_eq!(worker.held(), 1);

        assert!(m.destroy(id));
        assert!(!m.destroy(id), "second destroy is a no-op");
        worker.release_all();
        m.update(0.0);
        assert!(m.fragment(id).is_none());
        assert_eq!(m.stats().stale_completions, 1);
    }

    #[test]
    fn test_batches_respect_limits() {
        let worker = ManualWorker::default();
        let mut cfg = config(10, 1);
        cfg.worker = WorkerConfig {
            threads: 1,
            batch_size: 3,
            max_in_flight: 5,
            batch_interval_secs: 0.1,
        };
        let mut m = CloudManager::new(&cfg, Box::new(worker.clone()), 1280.0, 720.0, 11);
        m.populate();

        assert_eq!(m.update(0.0).submitted, 3);
        assert_eq!(m.update(0.05).submitted, 0, "pause between batches");
        assert_eq!(m.update(0.06).submitted, 2, "capped by in-flight limit");
        assert_eq!(m.update(0.2).submitted, 0);
        assert_eq!(worker.held(), 5);

        worker.release_all();
        m.update(0.2);
        assert_eq!(worker.held(), 3);
    }

    #[test]
    fn test_settings_speed_and_size_in_place() {
        let mut m = inline_manager(2, 1);
        m.populate();
        m.update(0.0);
        m.update(0.0);
        let ids = m.fragments().ids();
        let before: Vec<(f32, f32)> = ids
            .iter()
            .filter_map(|&id| m.fragment(id)?.spec().map(|s| (s.speed, s.width)))
            .collect();

        let mut clouds = m.settings().clone();
        clouds.base_speed *= 2.0;
        clouds.size_multiplier *= 1.5;
        let layers = LayerConfig::default();
        assert_eq!(m.apply_settings(&clouds, &layers), SettingsChange::Adjusted);
        assert_eq!(m.fragments().ids(), ids, "no fragment replaced");

        let after: Vec<(f32, f32)> = ids
            .iter()
            .filter_map(|&id| m.fragment(id)?.spec().map(|s| (s.speed, s.width)))
            .collect();
        for ((s0, w0), (s1, w1)) in before.into_iter().zip(after) {
            assert!((s1 - s0 * 2.0).abs() < 1e-3);
            assert!((w1 - w0 * 1.5).abs() < 1e-3);
        }
        assert_eq!(m.apply_settings(&clouds, &layers), SettingsChange::Unchanged);
    }

    #[test]
    fn test_layer_count_change_respawns() {
        let mut m = inline_manager(3, 2);
        m.populate();
        m.update(0.0);
        m.update(0.0);
        let old_ids = m.fragments().ids();

        let mut clouds = m.settings().clone();
        clouds.layer_count = 4;
        assert_eq!(
            m.apply_settings(&clouds, &LayerConfig::default()),
            SettingsChange::Respawned
        );
        assert_eq!(m.layers().len(), 4);
        assert!(m.fragments().ids().iter().all(|id| !old_ids.contains(id)));

        m.update(0.0);
        m.update(0.0);
        let expected: usize = m.layers().values().map(|l| layer_target(3, l.depth)).sum();
        assert_eq!(live_count(&m), expected);
    }

    #[test]
    fn test_draw_list_back_to_front() {
        let mut m = inline_manager(3, 3);
        m.populate();
        m.update(0.0);
        m.update(0.0);
        let items = m.draw_list();
        assert_eq!(items.len(), live_count(&m));
        for pair in items.windows(2) {
            assert!(pair[0].depth <= pair[1].depth);
        }
    }
}
