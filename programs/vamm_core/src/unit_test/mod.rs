mod math_test;
mod tick_bitmap_test;
