use criterion::{black_box, criterion_group, criterion_main, Criterion};

use neatkit::genomics::{GeneticConfig, Genome, InnovationPool};
use neatkit::populations::{Neat, PopulationConfig};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use std::num::NonZeroUsize;

fn grown_genome(
    config: &GeneticConfig,
    pool: &mut InnovationPool,
    rng: &mut ChaCha8Rng,
    mutations: usize,
) -> Genome {
    let mut genome = Genome::new(config);
    for _ in 0..mutations {
        genome.mutate_random(pool, config, rng);
    }
    genome
}

fn bench_distance(c: &mut Criterion) {
    let config = GeneticConfig {
        input_count: NonZeroUsize::new(4).unwrap(),
        output_count: NonZeroUsize::new(2).unwrap(),
        ..GeneticConfig::default()
    };
    let mut pool = InnovationPool::new(4, 2);
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let first = grown_genome(&config, &mut pool, &mut rng, 64);
    let second = grown_genome(&config, &mut pool, &mut rng, 64);

    c.bench_function("genetic_distance", |bench| {
        bench.iter(|| Genome::distance(black_box(&first), black_box(&second), &config))
    });
}

fn bench_mutation(c: &mut Criterion) {
    let config = GeneticConfig {
        input_count: NonZeroUsize::new(4).unwrap(),
        output_count: NonZeroUsize::new(2).unwrap(),
        ..GeneticConfig::default()
    };
    let mut pool = InnovationPool::new(4, 2);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut genome = grown_genome(&config, &mut pool, &mut rng, 32);

    c.bench_function("random_mutation", |bench| {
        bench.iter(|| genome.mutate_random(&mut pool, &config, &mut rng))
    });
}

fn bench_epoch(c: &mut Criterion) {
    let genetic_config = GeneticConfig {
        input_count: NonZeroUsize::new(3).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        ..GeneticConfig::default()
    };
    let population_config = PopulationConfig {
        initial_population_size: NonZeroUsize::new(64).unwrap(),
        target_population_size: NonZeroUsize::new(64).unwrap(),
        ..PopulationConfig::default()
    };

    c.bench_function("epoch_64", |bench| {
        let mut neat = Neat::with_seed(genetic_config.clone(), population_config.clone(), 2);
        bench.iter(|| {
            neat.evaluate_fitness(|network| network.evaluate(&[1.0, 0.0, 1.0])[0] + 0.1);
            neat.epoch().unwrap();
        });
    });
}

criterion_group!(benches, bench_distance, bench_mutation, bench_epoch);
criterion_main!(benches);
