#![allow(dead_code)]

use alloy_primitives::{Address, I256, U256};
use clmm_pool::math::{
    bit_math, math_helpers, sqrt_price_math, swap_math, tick_bitmap, tick_math,
};
use clmm_pool::pool::swap::SwapParams;
use clmm_pool::{FastMap, InMemoryLedger, Payer, Pool, PoolConfig, Q96};
use criterion::{Criterion, black_box};

pub fn bench_tick_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_math");
    group.bench_function("get_sqrt_ratio_at_tick", |b| {
        b.iter(|| tick_math::get_sqrt_ratio_at_tick(black_box(-123_456)))
    });
    let ratio = tick_math::get_sqrt_ratio_at_tick(-123_456).unwrap() + U256::from(12345u32);
    group.bench_function("get_tick_at_sqrt_ratio", |b| {
        b.iter(|| tick_math::get_tick_at_sqrt_ratio(black_box(ratio)))
    });
    group.finish();
}

pub fn bench_sqrt_price_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("sqrt_price_math");
    let price = Q96;
    let liquidity = 10u128.pow(18);
    let amount = U256::from(10u128.pow(15));

    group.bench_function("next_sqrt_price_from_input", |b| {
        b.iter(|| {
            sqrt_price_math::get_next_sqrt_price_from_input(
                black_box(price),
                black_box(liquidity),
                black_box(amount),
                true,
            )
        })
    });
    group.bench_function("next_sqrt_price_from_output", |b| {
        b.iter(|| {
            sqrt_price_math::get_next_sqrt_price_from_output(
                black_box(price),
                black_box(liquidity),
                black_box(amount),
                false,
            )
        })
    });

    let upper = tick_math::get_sqrt_ratio_at_tick(600).unwrap();
    group.bench_function("amount_0_delta", |b| {
        b.iter(|| {
            sqrt_price_math::get_amount_0_delta_base(
                black_box(price),
                black_box(upper),
                liquidity,
                true,
            )
        })
    });
    group.bench_function("amount_1_delta", |b| {
        b.iter(|| {
            sqrt_price_math::get_amount_1_delta_base(
                black_box(price),
                black_box(upper),
                liquidity,
                true,
            )
        })
    });
    group.finish();
}

pub fn bench_swap_math(c: &mut Criterion) {
    let target = tick_math::get_sqrt_ratio_at_tick(-600).unwrap();
    c.bench_function("compute_swap_step", |b| {
        b.iter(|| {
            swap_math::compute_swap_step(
                black_box(Q96),
                black_box(target),
                10u128.pow(18),
                I256::try_from(10u128.pow(15)).unwrap(),
                3000,
            )
        })
    });
}

pub fn bench_math_helpers(c: &mut Criterion) {
    let mut group = c.benchmark_group("math_helpers");
    let a = U256::MAX / U256::from(3u8);
    let b_ = U256::from(10u128.pow(30));
    let d = U256::MAX / U256::from(7u8);
    group.bench_function("mul_div", |b| {
        b.iter(|| math_helpers::mul_div(black_box(a), black_box(b_), black_box(d)))
    });
    group.bench_function("mul_div_rounding_up", |b| {
        b.iter(|| math_helpers::mul_div_rounding_up(black_box(a), black_box(b_), black_box(d)))
    });
    group.finish();
}

pub fn bench_tick_bitmap(c: &mut Criterion) {
    let mut bitmap: FastMap<i16, U256> = FastMap::default();
    for tick in [-12_000, -600, 0, 600, 12_000] {
        tick_bitmap::flip_tick(&mut bitmap, tick, 60).unwrap();
    }
    c.bench_function("next_initialized_tick_within_one_word", |b| {
        b.iter(|| {
            tick_bitmap::next_initialized_tick_within_one_word(
                black_box(&bitmap),
                black_box(-30),
                60,
                true,
            )
        })
    });
}

pub fn bench_bit_math(c: &mut Criterion) {
    let x = U256::from(1u8) << 200 | U256::from(1u8) << 3;
    c.bench_function("most_significant_bit", |b| {
        b.iter(|| bit_math::most_significant_bit(black_box(x)))
    });
    c.bench_function("least_significant_bit", |b| {
        b.iter(|| bit_math::least_significant_bit(black_box(x)))
    });
}

pub fn bench_pool_swap(c: &mut Criterion) {
    let lp = Address::repeat_byte(0x01);
    let config = PoolConfig::for_fee_tier(
        Address::repeat_byte(0x99),
        Address::repeat_byte(0x10),
        Address::repeat_byte(0x20),
        3000,
        lp,
    )
    .unwrap();
    let mut ledger = InMemoryLedger::new(1_000);
    ledger
        .mint_tokens(config.token0, lp, U256::from(10u128.pow(30)))
        .unwrap();
    ledger
        .mint_tokens(config.token1, lp, U256::from(10u128.pow(30)))
        .unwrap();

    let mut pool = Pool::new(config, ledger).unwrap();
    pool.initialize(Q96).unwrap();
    let mut payer = Payer::new(lp);
    for (lower, upper) in [(-6000, 6000), (-600, 600), (-1200, -60), (60, 1200)] {
        pool.mint(lp, lower, upper, 10u128.pow(18), &mut payer, &[])
            .unwrap();
    }

    let limit = tick_math::get_sqrt_ratio_at_tick(-3000).unwrap();
    c.bench_function("pool_swap_crossing_ticks", |b| {
        b.iter_batched(
            || pool.clone(),
            |mut pool| {
                let params = SwapParams::new(
                    lp,
                    true,
                    I256::try_from(10u128.pow(17)).unwrap(),
                    black_box(limit),
                );
                pool.swap(params, &mut payer, &[])
            },
            criterion::BatchSize::SmallInput,
        )
    });
}
